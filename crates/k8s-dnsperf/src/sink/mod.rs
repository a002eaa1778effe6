//! Result sinks
//!
//! A sink receives the final [`SummaryResult`] of a successful run and
//! reports what it did with it as a human-readable status line.

pub mod local;
pub mod opensearch;

pub use local::LocalSink;
pub use opensearch::OpenSearchSink;

use std::future::Future;
use std::path::PathBuf;

use k8s_dnsperf_common::SummaryResult;
use thiserror::Error;

use crate::config::SinkConfig;

/// Result sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search server rejected document ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Trait for summary consumers, for testability.
pub trait ResultSink: Send + Sync {
    /// Store one summary and describe where it went
    fn index(
        &self,
        summary: &SummaryResult,
    ) -> impl Future<Output = Result<String, SinkError>> + Send;
}

/// The configured sink
#[derive(Debug)]
pub enum Sink {
    Local(LocalSink),
    OpenSearch(OpenSearchSink),
}

impl Sink {
    /// Build the sink selected by configuration, if any
    pub fn from_config(config: &SinkConfig) -> Result<Option<Self>, SinkError> {
        Ok(match config {
            SinkConfig::None => None,
            SinkConfig::Local { directory } => Some(Sink::Local(LocalSink::new(directory.clone()))),
            SinkConfig::OpenSearch { server, index } => {
                Some(Sink::OpenSearch(OpenSearchSink::new(server, index)?))
            }
        })
    }
}

impl ResultSink for Sink {
    async fn index(&self, summary: &SummaryResult) -> Result<String, SinkError> {
        match self {
            Sink::Local(sink) => sink.index(summary).await,
            Sink::OpenSearch(sink) => sink.index(summary).await,
        }
    }
}
