//! Benchmark fleet lifecycle
//!
//! [`FleetOrchestrator`] creates the namespaced object set for a run, waits
//! until the DaemonSet has a ready pod on every selected node, and deletes
//! the namespace again afterwards.

pub mod manifests;
pub mod types;

pub use types::{FleetHandle, FleetSpec, InstanceRef};

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use k8s_dnsperf_common::defaults::{CREATE_BURST, CREATE_QPS, PROVISION_TIMEOUT_SECS};
use k8s_dnsperf_common::labels::{app_selector, service_fqdn};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::cluster::{ClusterError, ClusterOperations, FleetStatus};
use crate::wait::{retry_with_backoff, RetryConfig};

/// Fleet lifecycle errors
#[derive(Debug, Error)]
pub enum FleetError {
    /// An object could not be created or listed while provisioning
    #[error("failed to provision {kind}: {source}")]
    Provision {
        kind: &'static str,
        #[source]
        source: ClusterError,
    },

    #[error("provisioning did not complete within {0:?}")]
    ProvisionTimeout(Duration),

    /// The DaemonSet did not become ready in time
    #[error("DaemonSet {name} not ready after {timeout:?} ({ready}/{desired} pods ready)")]
    ReadinessTimeout {
        name: String,
        timeout: Duration,
        ready: i32,
        desired: i32,
    },

    /// Reading or watching DaemonSet status failed
    #[error("failed to watch DaemonSet {name}: {source}")]
    Watch {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("DaemonSet {name} watch ended before all pods were ready")]
    WatchEnded { name: String },

    #[error("failed to list benchmark pods: {0}")]
    ListPods(#[source] ClusterError),

    #[error("failed to delete namespace {namespace}: {source}")]
    Teardown {
        namespace: String,
        #[source]
        source: ClusterError,
    },
}

impl FleetError {
    fn provision(kind: &'static str) -> impl FnOnce(ClusterError) -> Self {
        move |source| FleetError::Provision { kind, source }
    }
}

/// Provisions, watches and tears down benchmark fleets
pub struct FleetOrchestrator<C> {
    cluster: Arc<C>,
    limiter: DefaultDirectRateLimiter,
    provision_timeout: Duration,
    retry: RetryConfig,
}

fn create_quota(qps: u32, burst: u32) -> Quota {
    let qps = NonZeroU32::new(qps).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    Quota::per_second(qps).allow_burst(burst)
}

impl<C: ClusterOperations> FleetOrchestrator<C> {
    pub fn new(cluster: Arc<C>) -> Self {
        Self {
            cluster,
            limiter: RateLimiter::direct(create_quota(CREATE_QPS, CREATE_BURST)),
            provision_timeout: Duration::from_secs(PROVISION_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }

    /// Override the object creation rate limit
    pub fn with_create_rate(mut self, qps: u32, burst: u32) -> Self {
        self.limiter = RateLimiter::direct(create_quota(qps, burst));
        self
    }

    /// Override the deadline for the whole provisioning step
    pub fn with_provision_timeout(mut self, timeout: Duration) -> Self {
        self.provision_timeout = timeout;
        self
    }

    /// Override the backoff used for idempotent control plane calls
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Create the namespace, target Services, record ConfigMap and
    /// DaemonSet for a run.
    ///
    /// An existing namespace is reused. Every other failure is fatal; the
    /// caller is expected to [`teardown`](Self::teardown) afterwards.
    #[instrument(skip_all, fields(run_id = %spec.run_id, namespace = %spec.namespace))]
    pub async fn provision(&self, spec: &FleetSpec) -> Result<FleetHandle, FleetError> {
        tokio::time::timeout(self.provision_timeout, self.provision_inner(spec))
            .await
            .map_err(|_| FleetError::ProvisionTimeout(self.provision_timeout))?
    }

    async fn provision_inner(&self, spec: &FleetSpec) -> Result<FleetHandle, FleetError> {
        let namespace = spec.namespace.as_str();
        info!(records = spec.records, selector = %spec.node_selector, "Deploying benchmark assets");

        match self.cluster.create_namespace(&manifests::namespace(spec)).await {
            Ok(()) => debug!("Namespace created"),
            Err(e) if e.is_already_exists() => warn!("Namespace already exists, reusing it"),
            Err(e) => return Err(FleetError::provision("namespace")(e)),
        }

        let created = self.create_services(spec).await?;
        debug!(count = created, "Services created");

        let selector = app_selector();
        let services = retry_with_backoff(
            &self.retry,
            "list services",
            || self.cluster.list_services(namespace, &selector),
            ClusterError::is_retryable,
        )
        .await
        .map_err(FleetError::provision("service list"))?;

        let mut fqdns: Vec<String> = services
            .iter()
            .filter_map(|svc| svc.metadata.name.as_deref())
            .map(|name| service_fqdn(name, namespace))
            .collect();
        fqdns.sort();

        let records = manifests::record_list(&fqdns, spec.record_type);
        self.cluster
            .create_config_map(namespace, &manifests::records_config_map(spec, records))
            .await
            .map_err(FleetError::provision("configmap"))?;
        debug!(records = fqdns.len() + 1, "Record list stored");

        self.cluster
            .create_daemon_set(namespace, &manifests::daemon_set(spec))
            .await
            .map_err(FleetError::provision("daemonset"))?;
        info!("Benchmark assets deployed");

        let mut handle = FleetHandle::from_spec(spec);
        handle.set_services(fqdns);
        Ok(handle)
    }

    /// Create Services 1..records through the shared token bucket and wait
    /// for all of them before returning.
    async fn create_services(&self, spec: &FleetSpec) -> Result<usize, FleetError> {
        let namespace = spec.namespace.as_str();
        let mut creations: FuturesUnordered<_> = (1..spec.records)
            .map(|n| {
                let service = manifests::service(spec, n);
                async move {
                    self.limiter.until_ready().await;
                    self.cluster.create_service(namespace, &service).await
                }
            })
            .collect();

        let mut created = 0;
        while let Some(result) = creations.next().await {
            result.map_err(FleetError::provision("service"))?;
            created += 1;
        }
        Ok(created)
    }

    /// Wait until every pod of the DaemonSet is ready, then record the
    /// running pods on the handle.
    ///
    /// Ready means at least one pod is scheduled and all scheduled pods are
    /// ready. Fails with [`FleetError::ReadinessTimeout`] once `timeout`
    /// elapses, or with a watch error if the status stream breaks.
    #[instrument(skip_all, fields(daemon_set = %handle.daemon_set(), timeout = ?timeout))]
    pub async fn await_ready(
        &self,
        handle: &mut FleetHandle,
        timeout: Duration,
    ) -> Result<Vec<InstanceRef>, FleetError> {
        let namespace = handle.namespace().to_string();
        let name = handle.daemon_set().to_string();
        let watch_error = |source: ClusterError| FleetError::Watch {
            name: name.clone(),
            source,
        };

        info!("Waiting for DaemonSet pods to be running");
        let mut last = self
            .cluster
            .daemon_set_status(&namespace, &name)
            .await
            .map_err(watch_error)?;

        if !last.is_ready() {
            let wait = async {
                let mut updates = self
                    .cluster
                    .watch_daemon_set(&namespace, &name)
                    .await
                    .map_err(watch_error)?;
                while let Some(status) = updates.next().await {
                    let status: FleetStatus = status.map_err(watch_error)?;
                    debug!(ready = status.ready, desired = status.desired, "DaemonSet status");
                    last = status;
                    if status.is_ready() {
                        return Ok::<(), FleetError>(());
                    }
                }
                Err(FleetError::WatchEnded { name: name.clone() })
            };
            let outcome = tokio::time::timeout(timeout, wait).await;
            match outcome {
                Ok(result) => result?,
                Err(_) => {
                    return Err(FleetError::ReadinessTimeout {
                        name,
                        timeout,
                        ready: last.ready,
                        desired: last.desired,
                    })
                }
            }
        }

        let selector = app_selector();
        let pods = retry_with_backoff(
            &self.retry,
            "list pods",
            || self.cluster.list_pods(&namespace, &selector),
            ClusterError::is_retryable,
        )
        .await
        .map_err(FleetError::ListPods)?;

        let instances: Vec<InstanceRef> =
            pods.iter().filter_map(InstanceRef::from_running_pod).collect();
        info!(pods = instances.len(), ready = last.ready, "DaemonSet ready");

        handle.set_instances(instances.clone());
        Ok(instances)
    }

    /// Delete the run's namespace.
    ///
    /// A namespace that is already gone counts as success, so this is safe
    /// after partial provisioning.
    #[instrument(skip_all, fields(namespace = %handle.namespace()))]
    pub async fn teardown(&self, handle: &FleetHandle) -> Result<(), FleetError> {
        let namespace = handle.namespace();
        info!("Destroying benchmark assets");

        let deleted = retry_with_backoff(
            &self.retry,
            "delete namespace",
            || self.cluster.delete_namespace(namespace),
            ClusterError::is_retryable,
        )
        .await;

        match deleted {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Namespace already deleted");
                Ok(())
            }
            Err(source) => Err(FleetError::Teardown {
                namespace: namespace.to_string(),
                source,
            }),
        }
    }
}
