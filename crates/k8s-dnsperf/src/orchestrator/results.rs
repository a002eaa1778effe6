//! Summary display and JSON output

use std::path::Path;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use k8s_dnsperf_common::SummaryResult;
use tracing::info;

/// Build the summary table shown after a successful run
pub fn summary_table(summary: &SummaryResult) -> Table {
    let rows: [(&str, String); 12] = [
        ("Nodes", summary.nodes.to_string()),
        ("Clients per node", summary.clients.to_string()),
        ("Records", format!("{} ({})", summary.records, summary.record_type)),
        ("Duration (s)", summary.duration.to_string()),
        ("Queries sent", summary.queries_sent.to_string()),
        ("Queries completed", summary.queries_completed.to_string()),
        ("Queries lost", summary.queries_lost.to_string()),
        ("Queries interrupted", summary.queries_interrupted.to_string()),
        ("QPS (mean per node)", format!("{:.2}", summary.qps)),
        ("Avg latency (ms)", format!("{:.2}", summary.avg_latency_ms)),
        (
            "Min / Max latency (ms)",
            format!("{:.2} / {:.2}", summary.min_latency_ms, summary.max_latency_ms),
        ),
        ("Latency stddev (ms)", format!("{:.2}", summary.latency_stdev_ms)),
    ];

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Metric"), Cell::new("Value")]);

    for (metric, value) in rows {
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Print a summary table of the run to stdout
pub fn print_results_summary(summary: &SummaryResult) {
    println!("\n=== DNS Benchmark Results ({}) ===\n", summary.uuid);
    println!("Target: {}", summary.target_server);
    println!("{}", summary_table(summary));
}

/// Write the summary as pretty JSON
pub fn write_results(path: &Path, summary: &SummaryResult) -> std::io::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    info!(path = %path.display(), "Results written");
    Ok(())
}
