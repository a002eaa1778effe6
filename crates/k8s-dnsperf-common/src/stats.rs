//! Reduction of per-node results into one summary
//!
//! Counters are independent totals and are summed. Rates and latencies are
//! averaged across contributing pods: a pod's QPS is reported as the mean
//! per-pod rate, not added up into a cluster throughput. Derived means are
//! floored at the hundredths digit so reports are reproducible.

use thiserror::Error;

use crate::result::{PerNodeResult, RunMetadata, SummaryResult};

/// Errors produced while aggregating results
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// No pod contributed a result
    #[error("cannot aggregate an empty result set")]
    EmptyResultSet,
}

/// Floor a value at two decimal places.
///
/// # Example
/// ```
/// use k8s_dnsperf_common::floor_hundredths;
///
/// assert_eq!(floor_hundredths(10397.611881), 10397.61);
/// assert_eq!(floor_hundredths(1.999), 1.99);
/// ```
pub fn floor_hundredths(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

/// Reduce every pod's result into one [`SummaryResult`].
///
/// Fails with [`AggregateError::EmptyResultSet`] when `results` is empty
/// instead of producing NaN means.
pub fn reduce(
    results: &[PerNodeResult],
    meta: RunMetadata,
) -> Result<SummaryResult, AggregateError> {
    if results.is_empty() {
        return Err(AggregateError::EmptyResultSet);
    }

    let total = results.iter().fold(PerNodeResult::default(), |acc, r| PerNodeResult {
        queries_sent: acc.queries_sent + r.queries_sent,
        queries_completed: acc.queries_completed + r.queries_completed,
        queries_lost: acc.queries_lost + r.queries_lost,
        queries_interrupted: acc.queries_interrupted + r.queries_interrupted,
        qps: acc.qps + r.qps,
        avg_latency_ms: acc.avg_latency_ms + r.avg_latency_ms,
        min_latency_ms: acc.min_latency_ms + r.min_latency_ms,
        max_latency_ms: acc.max_latency_ms + r.max_latency_ms,
        latency_stdev_ms: acc.latency_stdev_ms + r.latency_stdev_ms,
    });

    let count = results.len() as f64;
    let mean = |sum: f64| floor_hundredths(sum / count);

    Ok(SummaryResult {
        uuid: meta.uuid,
        clients: meta.clients,
        records: meta.records,
        record_type: meta.record_type,
        timestamp: meta.timestamp,
        duration: meta.duration_secs,
        target_server: meta.target_server,
        nodes: results.len(),
        queries_sent: total.queries_sent,
        queries_completed: total.queries_completed,
        queries_lost: total.queries_lost,
        queries_interrupted: total.queries_interrupted,
        qps: mean(total.qps),
        avg_latency_ms: mean(total.avg_latency_ms),
        max_latency_ms: mean(total.max_latency_ms),
        min_latency_ms: mean(total.min_latency_ms),
        latency_stdev_ms: mean(total.latency_stdev_ms),
    })
}
