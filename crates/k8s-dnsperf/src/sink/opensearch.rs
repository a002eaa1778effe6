//! OpenSearch / Elasticsearch sink

use std::time::Duration;

use k8s_dnsperf_common::SummaryResult;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ResultSink, SinkError};

/// Indexes each summary as one document via `POST <server>/<index>/_doc`
///
/// TLS certificates are not verified.
#[derive(Debug, Clone)]
pub struct OpenSearchSink {
    client: Client,
    server: String,
    index: String,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: Option<String>,
    result: Option<String>,
}

impl OpenSearchSink {
    pub fn new(server: &str, index: &str) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    pub fn document_url(&self) -> String {
        format!("{}/{}/_doc", self.server, self.index)
    }
}

impl ResultSink for OpenSearchSink {
    async fn index(&self, summary: &SummaryResult) -> Result<String, SinkError> {
        let url = self.document_url();
        debug!(url = %url, "Indexing summary");

        let response = self.client.post(&url).json(summary).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let indexed: IndexResponse = response.json().await?;
        Ok(format!(
            "Indexed 1 document to {}: {} ({})",
            self.index,
            indexed.result.as_deref().unwrap_or("created"),
            indexed.id.as_deref().unwrap_or("unknown id"),
        ))
    }
}
