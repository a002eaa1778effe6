//! Kubernetes API error classification
//!
//! Maps `kube::Error` onto the few cases the orchestrator acts on, using the
//! HTTP status code of the API response rather than message matching.

use thiserror::Error;

/// Control plane error categories for retry and cleanup logic
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object already exists (safe to ignore when creating the namespace)
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// Object was not found (safe to skip in teardown)
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// API server asked us to slow down (retryable with backoff)
    #[error("rate limited by API server: {message}")]
    Throttled { message: String },

    /// Any other API response
    #[error("Kubernetes API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// Connection, TLS, watch or decoding failure
    #[error("Kubernetes transport error: {0}")]
    Transport(String),
}

impl ClusterError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            ClusterError::Throttled { .. } | ClusterError::Transport(_) => true,
            ClusterError::Api { code, .. } => *code >= 500,
            ClusterError::AlreadyExists { .. } | ClusterError::NotFound { .. } => false,
        }
    }
}

/// Classify a `kube::Error` for an operation on `kind`/`name`.
pub fn classify_kube_error(kind: &'static str, name: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(response) => match response.code {
            404 => ClusterError::NotFound {
                kind,
                name: name.to_string(),
            },
            409 => ClusterError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            429 => ClusterError::Throttled {
                message: response.message,
            },
            code => ClusterError::Api {
                code,
                message: response.message,
            },
        },
        other => ClusterError::Transport(other.to_string()),
    }
}
