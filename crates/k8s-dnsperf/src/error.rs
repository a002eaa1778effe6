//! Error types for configuration and benchmark runs

use k8s_dnsperf_common::{AggregateError, ParseError, SummaryResult};
use thiserror::Error;

use crate::fleet::FleetError;
use crate::cluster::ExecError;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("run id must not be empty")]
    EmptyRunId,

    #[error("records must be at least 1")]
    InvalidRecords,

    #[error("clients must be at least 1")]
    InvalidClients,

    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("{0} must be at least one second")]
    TooShort(&'static str),

    #[error("invalid node selector term '{0}', expected key=value")]
    InvalidSelector(String),
}

/// Everything that can end a benchmark run early
#[derive(Debug, Error)]
pub enum RunError {
    /// Provisioning, readiness or pod discovery failed
    #[error(transparent)]
    Fleet(#[from] FleetError),

    /// dnsperf could not be run in a pod
    #[error("remote execution failed: {0}")]
    Exec(#[from] ExecError),

    #[error("failed to parse dnsperf output from pod {pod}: {source}")]
    Parse {
        pod: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A benchmark task panicked or was aborted
    #[error("benchmark task failed: {0}")]
    Task(String),

    #[error("benchmark run cancelled")]
    Cancelled,

    /// The run succeeded but its resources could not be removed. The
    /// measured summary is kept so it can still be reported.
    #[error("teardown failed: {source}")]
    Teardown {
        summary: Box<SummaryResult>,
        #[source]
        source: FleetError,
    },
}

impl RunError {
    /// Partial stderr captured from the pod, if this is an exec failure
    pub fn stderr(&self) -> Option<&str> {
        match self {
            RunError::Exec(e) => Some(e.stderr()),
            _ => None,
        }
    }

    /// Summary of a run whose only failure was teardown
    pub fn summary(&self) -> Option<&SummaryResult> {
        match self {
            RunError::Teardown { summary, .. } => Some(summary),
            _ => None,
        }
    }
}
