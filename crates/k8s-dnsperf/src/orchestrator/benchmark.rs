//! Concurrent dnsperf execution across the fleet

use std::sync::Arc;

use k8s_dnsperf_common::labels::RECORDS_PATH;
use k8s_dnsperf_common::{parse_output, PerNodeResult};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::cluster::PodExecutor;
use crate::config::BenchmarkConfig;
use crate::error::RunError;
use crate::fleet::InstanceRef;

/// dnsperf command line for one pod
///
/// `dnsperf -s <server> -p <port> -l <duration> -c <clients> -t <timeout> -d /records`
pub fn dnsperf_command(config: &BenchmarkConfig) -> Vec<String> {
    vec![
        "dnsperf".to_string(),
        "-s".to_string(),
        config.server.clone(),
        "-p".to_string(),
        config.port.to_string(),
        "-l".to_string(),
        config.duration.as_secs().to_string(),
        "-c".to_string(),
        config.clients.to_string(),
        "-t".to_string(),
        config.timeout.as_secs().to_string(),
        "-d".to_string(),
        RECORDS_PATH.to_string(),
    ]
}

/// Run `command` in every instance concurrently and parse each output.
///
/// At most `parallelism` execs are in flight (0 means one per instance).
/// The first failure cancels every other exec and is returned; results are
/// only returned when every instance succeeded, one per instance.
pub async fn execute_fleet<E: PodExecutor>(
    executor: Arc<E>,
    instances: &[InstanceRef],
    command: &[String],
    parallelism: usize,
    cancel: &CancellationToken,
) -> Result<Vec<PerNodeResult>, RunError> {
    let fanout = cancel.child_token();
    let limit = if parallelism == 0 {
        instances.len().max(1)
    } else {
        parallelism
    };
    let permits = Arc::new(Semaphore::new(limit));
    let command: Arc<[String]> = command.into();
    let (tx, mut rx) = mpsc::channel::<PerNodeResult>(instances.len().max(1));

    let mut tasks = JoinSet::new();
    for instance in instances.iter().cloned() {
        let executor = Arc::clone(&executor);
        let permits = Arc::clone(&permits);
        let command = Arc::clone(&command);
        let cancel = fanout.clone();
        let tx = tx.clone();

        tasks.spawn(async move {
            let _permit = tokio::select! {
                permit = permits.acquire_owned() => permit.map_err(|_| RunError::Cancelled)?,
                _ = cancel.cancelled() => return Err(RunError::Cancelled),
            };

            let output = executor.exec(&instance, &command, &cancel).await?;
            trace!(pod = %instance.name, stdout = %output.stdout, "dnsperf output");

            let result = parse_output(&output.stdout).map_err(|source| RunError::Parse {
                pod: instance.name.clone(),
                source,
            })?;
            debug!(pod = %instance.name, node = %instance.node, qps = result.qps, "Pod finished");

            tx.send(result).await.map_err(|_| RunError::Cancelled)
        });
    }
    drop(tx);

    let mut first_error: Option<RunError> = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(RunError::Task(e.to_string())));
        if let Err(e) = outcome {
            if first_error.is_none() {
                match e.stderr() {
                    Some(stderr) if !stderr.is_empty() => {
                        error!(error = %e, stderr = %stderr, "Benchmark failed, cancelling remaining pods")
                    }
                    _ => error!(error = %e, "Benchmark failed, cancelling remaining pods"),
                }
                fanout.cancel();
                first_error = Some(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let mut results = Vec::with_capacity(instances.len());
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    Ok(results)
}
