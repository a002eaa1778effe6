//! Benchmark run orchestration
//!
//! [`BenchmarkDriver`] sequences one run: provision the fleet, wait for it
//! to be ready, run dnsperf in every pod, parse and reduce the outputs, and
//! always tear the fleet down again.

pub mod benchmark;
pub mod results;

pub use benchmark::{dnsperf_command, execute_fleet};
pub use results::{print_results_summary, summary_table, write_results};

use std::sync::Arc;

use chrono::Utc;
use k8s_dnsperf_common::{reduce, RunMetadata, SummaryResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cluster::{ClusterOperations, PodExecutor};
use crate::config::BenchmarkConfig;
use crate::error::RunError;
use crate::fleet::{FleetHandle, FleetOrchestrator, FleetSpec};

/// Runs one benchmark end to end
pub struct BenchmarkDriver<C, E> {
    fleet: FleetOrchestrator<C>,
    executor: Arc<E>,
    spec: FleetSpec,
    benchmark: BenchmarkConfig,
}

impl<C: ClusterOperations, E: PodExecutor> BenchmarkDriver<C, E> {
    pub fn new(
        fleet: FleetOrchestrator<C>,
        executor: Arc<E>,
        spec: FleetSpec,
        benchmark: BenchmarkConfig,
    ) -> Self {
        Self {
            fleet,
            executor,
            spec,
            benchmark,
        }
    }

    /// Run the benchmark and return the cluster-wide summary.
    ///
    /// Teardown runs exactly once whatever happens before it. If the run
    /// failed, that error is returned and a teardown failure is only
    /// logged; if the run succeeded, a teardown failure is returned along
    /// with the summary.
    #[instrument(skip_all, fields(run_id = %self.spec.run_id))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<SummaryResult, RunError> {
        let mut handle = FleetHandle::from_spec(&self.spec);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Run cancelled");
                Err(RunError::Cancelled)
            }
            outcome = self.provision_and_measure(&mut handle, cancel) => outcome,
        };

        let teardown = self.fleet.teardown(&handle).await;

        match (outcome, teardown) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(summary), Err(source)) => Err(RunError::Teardown {
                summary: Box::new(summary),
                source,
            }),
            (Err(primary), Err(e)) => {
                warn!(error = %e, "Teardown also failed");
                Err(primary)
            }
            (Err(primary), Ok(())) => Err(primary),
        }
    }

    async fn provision_and_measure(
        &self,
        handle: &mut FleetHandle,
        cancel: &CancellationToken,
    ) -> Result<SummaryResult, RunError> {
        *handle = self.fleet.provision(&self.spec).await?;

        let instances = self
            .fleet
            .await_ready(handle, self.benchmark.ready_timeout)
            .await?;

        let command = dnsperf_command(&self.benchmark);
        info!(
            pods = instances.len(),
            duration_secs = self.benchmark.duration.as_secs(),
            "Running dnsperf"
        );
        let results = execute_fleet(
            Arc::clone(&self.executor),
            &instances,
            &command,
            self.benchmark.parallelism,
            cancel,
        )
        .await?;

        let meta = RunMetadata {
            uuid: self.spec.run_id.clone(),
            clients: self.benchmark.clients,
            records: self.spec.records,
            record_type: self.spec.record_type,
            duration_secs: self.benchmark.duration.as_secs(),
            target_server: self.benchmark.server.clone(),
            timestamp: Utc::now(),
        };
        let summary = reduce(&results, meta)?;

        info!(
            nodes = summary.nodes,
            qps = summary.qps,
            avg_latency_ms = summary.avg_latency_ms,
            "Benchmark complete"
        );
        if let Ok(json) = serde_json::to_string_pretty(&summary) {
            debug!("Summary:\n{json}");
        }
        Ok(summary)
    }
}
