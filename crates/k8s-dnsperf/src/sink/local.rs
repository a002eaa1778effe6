//! Local JSON file sink

use std::path::{Path, PathBuf};

use k8s_dnsperf_common::SummaryResult;
use tracing::debug;

use super::{ResultSink, SinkError};

/// Writes each summary to `<directory>/<uuid>.json`
#[derive(Debug, Clone)]
pub struct LocalSink {
    directory: PathBuf,
}

impl LocalSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, summary: &SummaryResult) -> PathBuf {
        self.directory.join(format!("{}.json", summary.uuid))
    }
}

impl ResultSink for LocalSink {
    async fn index(&self, summary: &SummaryResult) -> Result<String, SinkError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| SinkError::Io { path, source }
        };

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(io_error(&self.directory))?;

        let path = self.path_for(summary);
        let body = serde_json::to_vec_pretty(summary)?;
        tokio::fs::write(&path, body).await.map_err(io_error(&path))?;
        debug!(path = %path.display(), "Summary written");

        Ok(format!("Summary written to {}", path.display()))
    }
}
