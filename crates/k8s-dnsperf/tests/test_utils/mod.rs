//! Shared test utilities for integration tests
//!
//! In-memory stand-ins for the Kubernetes control plane and pod exec.
//! Generic fixtures (dnsperf output, run IDs) are in k8s-dnsperf-test-utils.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use k8s_dnsperf::cluster::{
    ClusterError, ClusterOperations, ExecError, ExecOutput, FleetStatus, PodExecutor, StatusStream,
};
use k8s_dnsperf::config::BenchmarkConfig;
use k8s_dnsperf::fleet::{FleetSpec, InstanceRef};
use k8s_dnsperf::wait::RetryConfig;
use k8s_dnsperf_common::labels::RECORDS_KEY;
use k8s_dnsperf_common::RecordType;
use k8s_dnsperf_test_utils::{dnsperf_output, pod_name, test_run_id};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, Namespace, Pod, PodSpec, PodStatus, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio_util::sync::CancellationToken;

pub const NAMESPACE: &str = "k8s-dnsperf";

/// stdout every healthy fake pod returns
pub fn healthy_output() -> String {
    dnsperf_output(1000, 990, 100.0, 0.002)
}

pub fn fleet_spec(records: u32) -> FleetSpec {
    FleetSpec {
        run_id: test_run_id(),
        namespace: NAMESPACE.to_string(),
        node_selector: "node-role.kubernetes.io/worker=".parse().unwrap(),
        records,
        record_type: RecordType::A,
        image: "quay.io/cloud-bulldozer/k8s-dnsperf:latest".to_string(),
    }
}

pub fn benchmark_config() -> BenchmarkConfig {
    BenchmarkConfig {
        duration: Duration::from_secs(1),
        timeout: Duration::from_secs(1),
        ready_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        max_retries: 2,
    }
}

/// How the fake DaemonSet progresses towards readiness
#[derive(Debug, Clone)]
pub enum Readiness {
    /// Ready on the first status read
    Immediate,
    /// Not ready at first; the watch yields these `(desired, ready)` updates
    /// and then ends
    Watch(Vec<(i32, i32)>),
    /// Never ready; the watch stays open
    Never,
    /// The watch fails with a transport error
    WatchFails,
}

#[derive(Debug, Default)]
pub struct ClusterState {
    pub namespaces: Vec<String>,
    pub services: Vec<Service>,
    pub config_maps: Vec<ConfigMap>,
    pub daemon_sets: Vec<DaemonSet>,
}

/// In-memory `ClusterOperations`
pub struct FakeCluster {
    nodes: usize,
    readiness: Readiness,
    failing_service: Option<String>,
    failing_delete: bool,
    state: Mutex<ClusterState>,
    deletes: AtomicUsize,
}

impl FakeCluster {
    /// A cluster with `nodes` selected nodes whose DaemonSet is ready at once
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            readiness: Readiness::Immediate,
            failing_service: None,
            failing_delete: false,
            state: Mutex::new(ClusterState::default()),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Namespace left over from an earlier run
    pub fn with_existing_namespace(self) -> Self {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .push(NAMESPACE.to_string());
        self
    }

    /// Reject creation of the n-th Service
    pub fn with_failing_service(mut self, n: u32) -> Self {
        self.failing_service = Some(format!("k8s-dnsperf-{n}"));
        self
    }

    /// Reject namespace deletion with a non-retryable error
    pub fn with_failing_delete(mut self) -> Self {
        self.failing_delete = true;
        self
    }

    /// Number of namespace deletions attempted
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .services
            .iter()
            .filter_map(|s| s.metadata.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Contents of the record list ConfigMap, if created
    pub fn records(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .first()
            .and_then(|cm| cm.data.as_ref())
            .and_then(|data| data.get(RECORDS_KEY).cloned())
    }

    pub fn daemon_set(&self) -> Option<DaemonSet> {
        self.state.lock().unwrap().daemon_sets.first().cloned()
    }

    pub fn namespace_exists(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .iter()
            .any(|n| n == NAMESPACE)
    }

    fn desired(&self) -> i32 {
        self.nodes as i32
    }

    fn pod(name: String, node: String, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: Some(NAMESPACE.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some(node),
                containers: vec![Container {
                    name: "k8s-dnsperf".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
        }
    }
}

fn already_exists(kind: &'static str, name: &str) -> ClusterError {
    ClusterError::AlreadyExists {
        kind,
        name: name.to_string(),
    }
}

impl ClusterOperations for FakeCluster {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<(), ClusterError> {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        if state.namespaces.contains(&name) {
            return Err(already_exists("namespace", &name));
        }
        state.namespaces.push(name);
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.failing_delete {
            return Err(ClusterError::Api {
                code: 403,
                message: "namespaces is forbidden".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        if !state.namespaces.iter().any(|n| n == name) {
            return Err(ClusterError::NotFound {
                kind: "namespace",
                name: name.to_string(),
            });
        }
        *state = ClusterState::default();
        Ok(())
    }

    async fn create_service(&self, _namespace: &str, service: &Service) -> Result<(), ClusterError> {
        let name = service.metadata.name.clone().unwrap_or_default();
        if self.failing_service.as_deref() == Some(name.as_str()) {
            return Err(ClusterError::Api {
                code: 422,
                message: format!("Service \"{name}\" is invalid"),
            });
        }
        let mut state = self.state.lock().unwrap();
        if state.services.iter().any(|s| s.metadata.name.as_deref() == Some(name.as_str())) {
            return Err(already_exists("service", &name));
        }
        state.services.push(service.clone());
        Ok(())
    }

    async fn list_services(
        &self,
        _namespace: &str,
        _selector: &str,
    ) -> Result<Vec<Service>, ClusterError> {
        Ok(self.state.lock().unwrap().services.clone())
    }

    async fn create_config_map(
        &self,
        _namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<(), ClusterError> {
        self.state.lock().unwrap().config_maps.push(config_map.clone());
        Ok(())
    }

    async fn create_daemon_set(
        &self,
        _namespace: &str,
        daemon_set: &DaemonSet,
    ) -> Result<(), ClusterError> {
        self.state.lock().unwrap().daemon_sets.push(daemon_set.clone());
        Ok(())
    }

    async fn daemon_set_status(
        &self,
        _namespace: &str,
        name: &str,
    ) -> Result<FleetStatus, ClusterError> {
        if self.state.lock().unwrap().daemon_sets.is_empty() {
            return Err(ClusterError::NotFound {
                kind: "daemonset",
                name: name.to_string(),
            });
        }
        Ok(match self.readiness {
            Readiness::Immediate => FleetStatus::new(self.desired(), self.desired()),
            _ => FleetStatus::new(self.desired(), 0),
        })
    }

    async fn watch_daemon_set(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<StatusStream, ClusterError> {
        Ok(match &self.readiness {
            Readiness::Immediate => {
                stream::iter(vec![Ok(FleetStatus::new(self.desired(), self.desired()))]).boxed()
            }
            Readiness::Watch(updates) => stream::iter(
                updates
                    .iter()
                    .map(|&(desired, ready)| Ok(FleetStatus::new(desired, ready)))
                    .collect::<Vec<_>>(),
            )
            .boxed(),
            Readiness::Never => stream::pending().boxed(),
            Readiness::WatchFails => stream::iter(vec![Err(ClusterError::Transport(
                "connection reset by peer".to_string(),
            ))])
            .boxed(),
        })
    }

    async fn list_pods(&self, _namespace: &str, _selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let mut pods: Vec<Pod> = (0..self.nodes)
            .map(|i| Self::pod(pod_name(i), format!("worker-{i}"), "Running"))
            .collect();
        // A pod from a node that is still pulling the image
        pods.push(Self::pod(
            "k8s-dnsperf-pending".to_string(),
            "worker-late".to_string(),
            "Pending",
        ));
        Ok(pods)
    }
}

/// In-memory `PodExecutor`
pub struct FakeExecutor {
    delay: Duration,
    failing_pod: Option<String>,
    garbage_pod: Option<String>,
    calls: AtomicUsize,
    succeeded: AtomicUsize,
    cancelled: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    /// Every pod returns [`healthy_output`] immediately
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            failing_pod: None,
            garbage_pod: None,
            calls: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Healthy pods take this long to finish
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// This pod exits non-zero at once with an error on stderr
    pub fn with_failing_pod(mut self, pod: impl Into<String>) -> Self {
        self.failing_pod = Some(pod.into());
        self
    }

    /// This pod prints output dnsperf would never produce
    pub fn with_garbage_pod(mut self, pod: impl Into<String>) -> Self {
        self.garbage_pod = Some(pod.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run(
        &self,
        instance: &InstanceRef,
        cancel: &CancellationToken,
    ) -> Result<ExecOutput, ExecError> {
        if self.failing_pod.as_deref() == Some(instance.name.as_str()) {
            return Err(ExecError::Failed {
                pod: instance.name.clone(),
                message: "command terminated with non-zero exit code".to_string(),
                stderr: "Error: invalid server address".to_string(),
            });
        }

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => {
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                return Err(ExecError::Cancelled {
                    pod: instance.name.clone(),
                    stderr: "[Status] Sending queries".to_string(),
                });
            }
        }

        let stdout = if self.garbage_pod.as_deref() == Some(instance.name.as_str()) {
            "dnsperf: command not found\n".to_string()
        } else {
            healthy_output()
        };
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        Ok(ExecOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

impl PodExecutor for FakeExecutor {
    async fn exec(
        &self,
        instance: &InstanceRef,
        _command: &[String],
        cancel: &CancellationToken,
    ) -> Result<ExecOutput, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.run(instance, cancel).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
