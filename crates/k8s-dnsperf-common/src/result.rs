//! Benchmark result records
//!
//! `PerNodeResult` is what one pod's dnsperf run produced; `SummaryResult`
//! is the cluster-wide document handed to the result sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record_type::RecordType;

/// Metrics parsed from one pod's dnsperf output
///
/// Latencies are in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerNodeResult {
    pub queries_sent: u64,
    pub queries_completed: u64,
    pub queries_lost: u64,
    pub queries_interrupted: u64,
    pub qps: f64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub latency_stdev_ms: f64,
}

/// Run-level fields copied verbatim into the summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// Benchmark run identifier
    pub uuid: String,
    /// dnsperf clients per pod
    pub clients: u32,
    /// Number of DNS records in the record list
    pub records: u32,
    pub record_type: RecordType,
    /// Benchmark duration in seconds
    pub duration_secs: u64,
    /// DNS server under load
    pub target_server: String,
    pub timestamp: DateTime<Utc>,
}

/// Cluster-wide aggregate of every pod's result
///
/// Counters are totals across pods. `qps` and the latency fields are the
/// mean per pod, floored to two decimals; `qps` is therefore *not* the
/// cluster-wide throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub uuid: String,
    pub clients: u32,
    pub records: u32,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    /// Benchmark duration in seconds
    pub duration: u64,
    pub target_server: String,
    /// Number of pods that contributed a result
    pub nodes: usize,
    pub queries_sent: u64,
    pub queries_completed: u64,
    pub queries_lost: u64,
    pub queries_interrupted: u64,
    pub qps: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub min_latency_ms: f64,
    pub latency_stdev_ms: f64,
}
