//! Configuration types for a benchmark run

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use k8s_dnsperf_common::defaults::{DEFAULT_IMAGE, DEFAULT_SELECTOR};
use k8s_dnsperf_common::labels::APP_NAME;
use k8s_dnsperf_common::RecordType;

use crate::error::ConfigError;
use crate::fleet::FleetSpec;

/// Kubernetes node selector, parsed from `key=value[,key=value]`.
///
/// An empty value is allowed (`node-role.kubernetes.io/worker=`), matching
/// how role labels are set on nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSelector(BTreeMap<String, String>);

impl NodeSelector {
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for NodeSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut labels = BTreeMap::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidSelector(term.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidSelector(term.to_string()));
            }
            labels.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self(labels))
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&terms.join(","))
    }
}

/// What gets deployed, and where
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Run identifier, stamped on every created object and the summary
    pub uuid: String,
    /// Nodes that receive a benchmark pod
    pub selector: NodeSelector,
    /// Number of DNS records to query (one is the kubernetes service itself)
    pub records: u32,
    pub record_type: RecordType,
    /// dnsperf container image
    pub image: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            selector: DEFAULT_SELECTOR.parse().unwrap_or_default(),
            records: k8s_dnsperf_common::defaults::DEFAULT_RECORDS,
            record_type: RecordType::default(),
            image: DEFAULT_IMAGE.to_string(),
        }
    }
}

/// dnsperf invocation parameters
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// DNS server queried by every pod
    pub server: String,
    pub port: u16,
    /// How long each dnsperf run lasts
    pub duration: Duration,
    /// Per-query timeout
    pub timeout: Duration,
    /// Concurrent dnsperf clients per pod
    pub clients: u32,
    /// How long to wait for the DaemonSet to become ready
    pub ready_timeout: Duration,
    /// Maximum concurrent execs (0 = one per pod, unbounded)
    pub parallelism: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        use k8s_dnsperf_common::defaults::*;
        Self {
            server: DEFAULT_DNS_SERVER.to_string(),
            port: DEFAULT_DNS_PORT,
            duration: Duration::from_secs(DEFAULT_DURATION_SECS),
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            clients: DEFAULT_CLIENTS,
            ready_timeout: Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS),
            parallelism: 0,
        }
    }
}

/// Where the summary is indexed after a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SinkConfig {
    #[default]
    None,
    /// Write the summary as JSON into a directory
    Local { directory: PathBuf },
    /// POST the summary to an OpenSearch/Elasticsearch index
    OpenSearch { server: String, index: String },
}

/// Configuration for a benchmark run
///
/// Composed of focused sub-configs, mirroring the stages of a run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub fleet: FleetConfig,
    pub benchmark: BenchmarkConfig,
    pub sink: SinkConfig,
    /// Also write the summary JSON to this file
    pub output: Option<PathBuf>,
}

impl RunConfig {
    /// Reject configurations that would produce an invalid deployment or
    /// dnsperf command line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fleet.uuid.trim().is_empty() {
            return Err(ConfigError::EmptyRunId);
        }
        if self.fleet.records == 0 {
            return Err(ConfigError::InvalidRecords);
        }
        if self.fleet.image.trim().is_empty() {
            return Err(ConfigError::Missing("image"));
        }
        if self.benchmark.clients == 0 {
            return Err(ConfigError::InvalidClients);
        }
        if self.benchmark.server.trim().is_empty() {
            return Err(ConfigError::Missing("dns server"));
        }
        if self.benchmark.duration.as_secs() == 0 {
            return Err(ConfigError::TooShort("duration"));
        }
        if self.benchmark.timeout.as_secs() == 0 {
            return Err(ConfigError::TooShort("timeout"));
        }
        if self.benchmark.ready_timeout.is_zero() {
            return Err(ConfigError::TooShort("ready timeout"));
        }
        if let SinkConfig::OpenSearch { server, index } = &self.sink {
            if server.trim().is_empty() {
                return Err(ConfigError::Missing("search server"));
            }
            if index.trim().is_empty() {
                return Err(ConfigError::Missing("search index"));
            }
        }
        Ok(())
    }

    /// Provisioning intent derived from this configuration
    pub fn fleet_spec(&self) -> FleetSpec {
        FleetSpec {
            run_id: self.fleet.uuid.clone(),
            namespace: APP_NAME.to_string(),
            node_selector: self.fleet.selector.clone(),
            records: self.fleet.records,
            record_type: self.fleet.record_type,
            image: self.fleet.image.clone(),
        }
    }
}
