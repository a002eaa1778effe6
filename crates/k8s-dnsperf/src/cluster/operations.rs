//! Kubernetes object operations
//!
//! [`ClusterOperations`] is the narrow set of control plane calls the fleet
//! orchestrator needs. [`KubeCluster`] implements it over `kube`.

use std::future::Future;

use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Service};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use super::error::{classify_kube_error, ClusterError};

/// Scheduling progress of a DaemonSet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStatus {
    /// Pods the DaemonSet should be running (`desiredNumberScheduled`)
    pub desired: i32,
    /// Pods that are ready (`numberReady`)
    pub ready: i32,
}

impl FleetStatus {
    pub fn new(desired: i32, ready: i32) -> Self {
        Self { desired, ready }
    }

    /// Every scheduled pod is ready, and at least one pod is scheduled.
    ///
    /// `0/0` is not ready: it means the selector matched no node yet.
    pub fn is_ready(&self) -> bool {
        self.desired > 0 && self.ready == self.desired
    }

    fn of(daemon_set: &DaemonSet) -> Self {
        daemon_set
            .status
            .as_ref()
            .map(|s| Self::new(s.desired_number_scheduled, s.number_ready))
            .unwrap_or_default()
    }
}

/// Stream of DaemonSet status updates
pub type StatusStream = BoxStream<'static, Result<FleetStatus, ClusterError>>;

/// Trait for the control plane calls made while provisioning, waiting and
/// tearing down, for testability.
pub trait ClusterOperations: Send + Sync {
    /// Create a cluster-scoped namespace
    fn create_namespace(
        &self,
        namespace: &Namespace,
    ) -> impl Future<Output = Result<(), ClusterError>> + Send;

    /// Delete a namespace and everything in it
    fn delete_namespace(&self, name: &str) -> impl Future<Output = Result<(), ClusterError>> + Send;

    fn create_service(
        &self,
        namespace: &str,
        service: &Service,
    ) -> impl Future<Output = Result<(), ClusterError>> + Send;

    /// List services matching a label selector
    fn list_services(
        &self,
        namespace: &str,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Service>, ClusterError>> + Send;

    fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> impl Future<Output = Result<(), ClusterError>> + Send;

    fn create_daemon_set(
        &self,
        namespace: &str,
        daemon_set: &DaemonSet,
    ) -> impl Future<Output = Result<(), ClusterError>> + Send;

    /// Current status of a DaemonSet
    fn daemon_set_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<FleetStatus, ClusterError>> + Send;

    /// Watch a DaemonSet, yielding its status after every change
    fn watch_daemon_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<StatusStream, ClusterError>> + Send;

    /// List pods matching a label selector
    fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Pod>, ClusterError>> + Send;
}

/// `ClusterOperations` over a live API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ClusterOperations for KubeCluster {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<(), ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let name = namespace.name_any();
        api.create(&PostParams::default(), namespace)
            .await
            .map_err(|e| classify_kube_error("namespace", &name, e))?;
        debug!(namespace = %name, "Created namespace");
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify_kube_error("namespace", name, e))?;
        debug!(namespace = %name, "Namespace deletion requested");
        Ok(())
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> Result<(), ClusterError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), service)
            .await
            .map_err(|e| classify_kube_error("service", &service.name_any(), e))?;
        Ok(())
    }

    async fn list_services(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<Service>, ClusterError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(|e| classify_kube_error("service", selector, e))?;
        Ok(list.items)
    }

    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> Result<(), ClusterError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), config_map)
            .await
            .map_err(|e| classify_kube_error("configmap", &config_map.name_any(), e))?;
        Ok(())
    }

    async fn create_daemon_set(
        &self,
        namespace: &str,
        daemon_set: &DaemonSet,
    ) -> Result<(), ClusterError> {
        let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), daemon_set)
            .await
            .map_err(|e| classify_kube_error("daemonset", &daemon_set.name_any(), e))?;
        Ok(())
    }

    async fn daemon_set_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<FleetStatus, ClusterError> {
        let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), namespace);
        let daemon_set = api
            .get(name)
            .await
            .map_err(|e| classify_kube_error("daemonset", name, e))?;
        Ok(FleetStatus::of(&daemon_set))
    }

    async fn watch_daemon_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<StatusStream, ClusterError> {
        let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), namespace);
        let config = watcher::Config::default().fields(&format!("metadata.name={name}"));
        let stream = watcher(api, config)
            .applied_objects()
            .map_ok(|daemon_set| FleetStatus::of(&daemon_set))
            .map_err(|e| ClusterError::Transport(format!("watch failed: {e}")))
            .boxed();
        Ok(stream)
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(|e| classify_kube_error("pod", selector, e))?;
        Ok(list.items)
    }
}
