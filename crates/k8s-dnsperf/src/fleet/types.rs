//! Provisioning intent and live fleet state

use k8s_dnsperf_common::labels::APP_NAME;
use k8s_dnsperf_common::RecordType;
use k8s_openapi::api::core::v1::Pod;

use crate::config::NodeSelector;

/// Immutable provisioning intent for one run
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSpec {
    /// Run identifier, stamped as a label on created objects
    pub run_id: String,
    /// Namespace holding every object of the run
    pub namespace: String,
    /// Nodes that receive a benchmark pod
    pub node_selector: NodeSelector,
    /// Number of DNS records; `records - 1` Services are created
    pub records: u32,
    pub record_type: RecordType,
    /// dnsperf container image
    pub image: String,
}

/// One running benchmark pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub name: String,
    pub namespace: String,
    /// Node the pod is scheduled on (empty if not yet reported)
    pub node: String,
    /// Container that runs dnsperf
    pub container: String,
}

impl InstanceRef {
    /// Build a reference from a pod in the `Running` phase.
    ///
    /// Returns `None` for pods in any other phase or without a name.
    pub fn from_running_pod(pod: &Pod) -> Option<Self> {
        let phase = pod.status.as_ref()?.phase.as_deref()?;
        if phase != "Running" {
            return None;
        }
        let spec = pod.spec.as_ref();
        let container = spec
            .and_then(|s| s.containers.first())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| APP_NAME.to_string());

        Some(Self {
            name: pod.metadata.name.clone()?,
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            node: spec.and_then(|s| s.node_name.clone()).unwrap_or_default(),
            container,
        })
    }
}

/// Live state of a provisioned fleet
///
/// Created empty from the fleet spec so teardown can run even when provisioning
/// failed partway through.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetHandle {
    namespace: String,
    daemon_set: String,
    services: Vec<String>,
    instances: Vec<InstanceRef>,
}

impl FleetHandle {
    pub fn from_spec(spec: &FleetSpec) -> Self {
        Self {
            namespace: spec.namespace.clone(),
            daemon_set: APP_NAME.to_string(),
            services: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn daemon_set(&self) -> &str {
        &self.daemon_set
    }

    /// Fully-qualified names of the created Services
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Running pods, known once readiness has been reached
    pub fn instances(&self) -> &[InstanceRef] {
        &self.instances
    }

    pub(crate) fn set_services(&mut self, services: Vec<String>) {
        self.services = services;
    }

    pub(crate) fn set_instances(&mut self, instances: Vec<InstanceRef>) {
        self.instances = instances;
    }
}
