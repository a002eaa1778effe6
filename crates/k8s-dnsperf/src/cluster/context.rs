//! Shared Kubernetes client context

use kube::Client;

use super::error::ClusterError;
use super::exec::KubeExecutor;
use super::operations::KubeCluster;

/// Kubernetes client loaded once and shared by the cluster and exec
/// implementations.
///
/// Configuration is inferred the usual way: `KUBECONFIG` or
/// `~/.kube/config`, falling back to the in-cluster service account.
#[derive(Clone)]
pub struct KubeContext {
    client: Client,
}

impl KubeContext {
    pub async fn new() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Transport(format!("failed to load kubeconfig: {e}")))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn cluster(&self) -> KubeCluster {
        KubeCluster::new(self.client())
    }

    pub fn executor(&self) -> KubeExecutor {
        KubeExecutor::new(self.client())
    }
}

impl std::fmt::Debug for KubeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeContext")
            .field("default_namespace", &self.client.default_namespace())
            .finish()
    }
}
