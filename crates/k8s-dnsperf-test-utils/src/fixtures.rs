//! Captured dnsperf output
//!
//! Real output from dnsperf 2.12.0, used to exercise the parser and the
//! end-to-end driver tests.

/// Output of `dnsperf -l 5 -c 10 -d input -c 1 -s 127.0.0.53`
pub const DNSPERF_OUTPUT: &str = "DNS Performance Testing Tool
Version 2.12.0

[Status] Command line: dnsperf -l 5 -c 10 -d input -c 1 -s 127.0.0.53
[Status] Sending queries (to 127.0.0.53:53)
[Status] Started at: Mon Sep 30 12:15:58 2024
[Status] Stopping after 5.000000 seconds
[Status] Testing complete (time limit)

Statistics:

  Queries sent:         52083
  Queries completed:    52083 (100.00%)
  Queries lost:         0 (0.00%)

  Response codes:       NOERROR 26042 (50.00%), NXDOMAIN 26041 (50.00%)
  Average packet size:  request 37, response 82
  Run time (s):         5.009131
  Queries per second:   10397.611881

  Average Latency (s):  0.009546 (min 0.004271, max 0.167582)
  Latency StdDev (s):   0.005814

";

/// Output of a run stopped early, including the `interrupted` counter
pub const DNSPERF_OUTPUT_INTERRUPTED: &str = "DNS Performance Testing Tool
Version 2.14.0

[Status] Command line: dnsperf -s 172.30.0.10 -p 53 -l 60 -c 1 -t 1 -d /records
[Status] Sending queries (to 172.30.0.10:53)
[Status] Started at: Tue Oct  1 09:02:11 2024
[Status] Stopping after 60.000000 seconds
[Interrupted] Received signal, stopping

Statistics:

  Queries sent:         1200
  Queries completed:    1150 (95.83%)
  Queries lost:         40 (3.33%)
  Queries interrupted:  10 (0.83%)

  Response codes:       NOERROR 1150 (100.00%)
  Average packet size:  request 40, response 96
  Run time (s):         12.000000
  Queries per second:   95.833333

  Average Latency (s):  0.001250 (min 0.000310, max 0.020000)
  Latency StdDev (s):   0.000900

";

/// Build dnsperf output with the given headline numbers.
///
/// Latencies are given in seconds, as dnsperf prints them.
pub fn dnsperf_output(sent: u64, completed: u64, qps: f64, avg_latency_secs: f64) -> String {
    let lost = sent.saturating_sub(completed);
    format!(
        "Statistics:\n\n  \
         Queries sent:         {sent}\n  \
         Queries completed:    {completed} (100.00%)\n  \
         Queries lost:         {lost} (0.00%)\n\n  \
         Response codes:       NOERROR {completed} (100.00%)\n  \
         Queries per second:   {qps:.6}\n\n  \
         Average Latency (s):  {avg:.6} (min {min:.6}, max {max:.6})\n  \
         Latency StdDev (s):   {stddev:.6}\n",
        avg = avg_latency_secs,
        min = avg_latency_secs / 2.0,
        max = avg_latency_secs * 2.0,
        stddev = avg_latency_secs / 4.0,
    )
}
