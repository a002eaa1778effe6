//! k8s-dnsperf: fleet-wide DNS benchmark for Kubernetes clusters
//!
//! Deploys dnsperf on every selected node, runs it concurrently, prints the
//! aggregated results and removes everything it created.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use k8s_dnsperf::cluster::KubeContext;
use k8s_dnsperf::config::{self, NodeSelector};
use k8s_dnsperf::error::RunError;
use k8s_dnsperf::fleet::FleetOrchestrator;
use k8s_dnsperf::orchestrator::{self, BenchmarkDriver};
use k8s_dnsperf::sink::{ResultSink, Sink};
use k8s_dnsperf_common::defaults::{
    DEFAULT_CLIENTS, DEFAULT_DNS_PORT, DEFAULT_DNS_SERVER, DEFAULT_ES_INDEX, DEFAULT_IMAGE,
    DEFAULT_RECORDS, DEFAULT_SELECTOR,
};
use k8s_dnsperf_common::{RecordType, SummaryResult};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "k8s-dnsperf")]
#[command(about = "Fleet-wide DNS performance benchmark for Kubernetes")]
#[command(version)]
struct Args {
    /// Benchmark run identifier (random if not given)
    #[arg(long)]
    uuid: Option<String>,

    /// DaemonSet node selector, key=value[,key=value]
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    selector: NodeSelector,

    /// Number of DNS records to query; records-1 Services are created
    #[arg(long, default_value_t = DEFAULT_RECORDS)]
    records: u32,

    /// DNS record type to query (A or AAAA)
    #[arg(long, default_value = "A")]
    record_type: RecordType,

    /// Benchmark duration (e.g. 30s, 5m)
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    duration: Duration,

    /// Per-query timeout
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// DNS server to benchmark
    #[arg(long, default_value = DEFAULT_DNS_SERVER)]
    dns_server: String,

    /// DNS server port
    #[arg(long, default_value_t = DEFAULT_DNS_PORT)]
    port: u16,

    /// dnsperf clients per pod
    #[arg(long, default_value_t = DEFAULT_CLIENTS)]
    clients: u32,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    loglevel: String,

    /// OpenSearch/Elasticsearch endpoint to index the summary into
    #[arg(long, env = "ES_SERVER")]
    es_server: Option<String>,

    /// Search index name
    #[arg(long, default_value = DEFAULT_ES_INDEX)]
    es_index: String,

    /// Write the summary JSON into this directory (ignored with --es-server)
    #[arg(long)]
    metrics_directory: Option<PathBuf>,

    /// dnsperf container image
    #[arg(long, default_value = DEFAULT_IMAGE)]
    image: String,

    /// How long to wait for every benchmark pod to become ready
    #[arg(long, default_value = "5m", value_parser = humantime::parse_duration)]
    ready_timeout: Duration,

    /// Maximum concurrent dnsperf executions (0 = all pods at once)
    #[arg(long, default_value_t = 0)]
    parallelism: usize,

    /// Also write the summary JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn sink(&self) -> config::SinkConfig {
        match (&self.es_server, &self.metrics_directory) {
            (Some(server), _) => config::SinkConfig::OpenSearch {
                server: server.clone(),
                index: self.es_index.clone(),
            },
            (None, Some(directory)) => config::SinkConfig::Local {
                directory: directory.clone(),
            },
            (None, None) => config::SinkConfig::None,
        }
    }
}

impl From<Args> for config::RunConfig {
    fn from(args: Args) -> Self {
        let sink = args.sink();
        Self {
            fleet: config::FleetConfig {
                uuid: args
                    .uuid
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                selector: args.selector,
                records: args.records,
                record_type: args.record_type,
                image: args.image,
            },
            benchmark: config::BenchmarkConfig {
                server: args.dns_server,
                port: args.port,
                duration: args.duration,
                timeout: args.timeout,
                clients: args.clients,
                ready_timeout: args.ready_timeout,
                parallelism: args.parallelism,
            },
            sink,
            output: args.output,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Report a failed run on stderr: the error chain, then whatever dnsperf
/// printed before failing.
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut out = std::io::stderr().lock();
    let _ = writeln!(out, "\n\x1b[1;31merror:\x1b[0m {e}");
    for cause in e.chain().skip(1) {
        let _ = writeln!(out, "  \x1b[33mcaused by:\x1b[0m {cause}");
    }

    let pod_stderr = e
        .downcast_ref::<RunError>()
        .and_then(RunError::stderr)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(pod_stderr) = pod_stderr {
        let _ = writeln!(out, "\n\x1b[2mdnsperf stderr:\x1b[0m");
        for line in pod_stderr.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
}

fn banner() -> String {
    format!("k8s-dnsperf {}", env!("CARGO_PKG_VERSION"))
}

fn init_tracing(loglevel: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(loglevel)
            .with_context(|| format!("Invalid log level '{loglevel}'"))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.loglevel)?;

    let config = config::RunConfig::from(args);
    config.validate().context("Invalid configuration")?;

    let sink = Sink::from_config(&config.sink).context("Failed to set up result sink")?;

    let kube = KubeContext::new()
        .await
        .context("Failed to connect to the Kubernetes cluster")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling benchmark and cleaning up");
                cancel.cancel();
            }
        }
    });

    info!(
        uuid = %config.fleet.uuid,
        server = %config.benchmark.server,
        records = config.fleet.records,
        "Starting {}",
        banner()
    );

    let driver = BenchmarkDriver::new(
        FleetOrchestrator::new(Arc::new(kube.cluster())),
        Arc::new(kube.executor()),
        config.fleet_spec(),
        config.benchmark.clone(),
    );

    match driver.run(&cancel).await {
        Ok(summary) => report(&config, sink.as_ref(), &summary).await,
        Err(e @ RunError::Teardown { .. }) => {
            if let Some(summary) = e.summary() {
                report(&config, sink.as_ref(), summary).await?;
            }
            Err(e).context("Benchmark resources were not cleaned up")
        }
        Err(e) => Err(e).context("Benchmark run failed"),
    }
}

/// Print the summary, then write and index it where configured
async fn report(
    config: &config::RunConfig,
    sink: Option<&Sink>,
    summary: &SummaryResult,
) -> Result<()> {
    orchestrator::print_results_summary(summary);

    if let Some(path) = &config.output {
        orchestrator::write_results(path, summary)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
    }

    if let Some(sink) = sink {
        let status = sink.index(summary).await.context("Failed to index results")?;
        info!("{status}");
    }

    Ok(())
}
