//! Kubernetes control plane access
//!
//! Everything that talks to the API server sits behind two traits so the
//! orchestration logic can be exercised against in-memory fakes:
//!
//! - [`ClusterOperations`]: object CRUD, DaemonSet status and watch
//! - [`PodExecutor`]: running a command inside a pod

pub mod context;
pub mod error;
pub mod exec;
pub mod operations;

pub use context::KubeContext;
pub use error::{classify_kube_error, ClusterError};
pub use exec::{ExecError, ExecOutput, KubeExecutor, PodExecutor};
pub use operations::{ClusterOperations, FleetStatus, KubeCluster, StatusStream};
