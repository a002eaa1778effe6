//! Running commands inside pods over the exec websocket

use std::future::Future;

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::AttachParams;
use kube::{Api, Client};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fleet::InstanceRef;

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Exec failures. Every variant that got as far as reading output carries
/// the stderr captured so far.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to open exec stream to pod {pod}: {message}")]
    Connect { pod: String, message: String },

    #[error("command failed in pod {pod}: {message} (stderr: {stderr})")]
    Failed {
        pod: String,
        message: String,
        stderr: String,
    },

    #[error("exec stream to pod {pod} broke: {message} (stderr: {stderr})")]
    Transport {
        pod: String,
        message: String,
        stderr: String,
    },

    #[error("exec in pod {pod} cancelled")]
    Cancelled { pod: String, stderr: String },
}

impl ExecError {
    /// Pod the command ran in
    pub fn pod(&self) -> &str {
        match self {
            ExecError::Connect { pod, .. }
            | ExecError::Failed { pod, .. }
            | ExecError::Transport { pod, .. }
            | ExecError::Cancelled { pod, .. } => pod,
        }
    }

    /// stderr captured before the failure (empty if none was read)
    pub fn stderr(&self) -> &str {
        match self {
            ExecError::Connect { .. } => "",
            ExecError::Failed { stderr, .. }
            | ExecError::Transport { stderr, .. }
            | ExecError::Cancelled { stderr, .. } => stderr,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled { .. })
    }
}

/// Trait for running one command in one pod, for testability.
pub trait PodExecutor: Send + Sync + 'static {
    /// Run `command` in the instance's container and wait for it to exit.
    ///
    /// Returns early with [`ExecError::Cancelled`] once `cancel` fires.
    fn exec(
        &self,
        instance: &InstanceRef,
        command: &[String],
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ExecOutput, ExecError>> + Send;
}

/// `PodExecutor` over the Kubernetes exec subresource
#[derive(Clone)]
pub struct KubeExecutor {
    client: Client,
}

impl KubeExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PodExecutor for KubeExecutor {
    async fn exec(
        &self,
        instance: &InstanceRef,
        command: &[String],
        cancel: &CancellationToken,
    ) -> Result<ExecOutput, ExecError> {
        let pod = instance.name.clone();
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &instance.namespace);
        let params = AttachParams::default()
            .container(instance.container.clone())
            .stdin(false)
            .stdout(true)
            .stderr(true);

        debug!(pod = %pod, command = %command.join(" "), "Running command");

        let mut attached = tokio::select! {
            attached = api.exec(&instance.name, command.to_vec(), &params) => {
                attached.map_err(|e| ExecError::Connect { pod: pod.clone(), message: e.to_string() })?
            }
            _ = cancel.cancelled() => {
                return Err(ExecError::Cancelled { pod, stderr: String::new() });
            }
        };

        let stdout_reader = attached.stdout();
        let stderr_reader = attached.stderr();
        let (Some(mut stdout_reader), Some(mut stderr_reader)) = (stdout_reader, stderr_reader)
        else {
            return Err(ExecError::Transport {
                pod,
                message: "stdout/stderr not attached".to_string(),
                stderr: String::new(),
            });
        };
        let status = attached.take_status();

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let reads = tokio::select! {
            (out, err) = async {
                tokio::join!(
                    stdout_reader.read_to_end(&mut stdout),
                    stderr_reader.read_to_end(&mut stderr),
                )
            } => Some(out.and(err)),
            _ = cancel.cancelled() => None,
        };
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        match reads {
            None => return Err(ExecError::Cancelled { pod, stderr }),
            Some(Err(e)) => {
                return Err(ExecError::Transport {
                    pod,
                    message: e.to_string(),
                    stderr,
                })
            }
            Some(Ok(_)) => {}
        }

        let status = match status {
            Some(status) => tokio::select! {
                status = status => status,
                _ = cancel.cancelled() => return Err(ExecError::Cancelled { pod, stderr }),
            },
            None => None,
        };

        if let Err(e) = attached.join().await {
            warn!(pod = %pod, error = %e, "Exec stream did not close cleanly");
        }

        exit_result(pod, status, &stdout, stderr)
    }
}

/// Turn the exec Status channel's verdict into the command outcome.
///
/// Only an explicit `Success` counts; stderr is kept on every failure.
fn exit_result(
    pod: String,
    status: Option<Status>,
    stdout: &[u8],
    stderr: String,
) -> Result<ExecOutput, ExecError> {
    match status {
        Some(s) if s.status.as_deref() == Some("Success") => Ok(ExecOutput {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr,
        }),
        Some(s) => Err(ExecError::Failed {
            pod,
            message: s
                .message
                .or(s.reason)
                .unwrap_or_else(|| "non-zero exit".to_string()),
            stderr,
        }),
        None => Err(ExecError::Transport {
            pod,
            message: "exec stream closed without an exit status".to_string(),
            stderr,
        }),
    }
}
