//! dnsperf output parser
//!
//! dnsperf prints a free-text statistics block at the end of a run:
//!
//! ```text
//! Statistics:
//!
//!   Queries sent:         52083
//!   Queries completed:    52083 (100.00%)
//!   Queries lost:         0 (0.00%)
//!
//!   Response codes:       NOERROR 26042 (50.00%), NXDOMAIN 26041 (50.00%)
//!   Average packet size:  request 37, response 82
//!   Run time (s):         5.009131
//!   Queries per second:   10397.611881
//!
//!   Average Latency (s):  0.009546 (min 0.004271, max 0.167582)
//!   Latency StdDev (s):   0.005814
//! ```
//!
//! Each field is found by its own label-anchored pattern. Fields that every
//! dnsperf version prints are required; `lost` and `interrupted` are missing
//! from some versions and default to zero. Everything else is ignored.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::result::PerNodeResult;

/// Seconds to milliseconds
const MS_PER_SEC: f64 = 1000.0;

static SENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"Queries sent:\s+(\d+)"));
static COMPLETED: LazyLock<Regex> = LazyLock::new(|| pattern(r"Queries completed:\s+(\d+)"));
static LOST: LazyLock<Regex> = LazyLock::new(|| pattern(r"Queries lost:\s+(\d+)"));
static INTERRUPTED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Queries interrupted:\s+(\d+)"));
static QPS: LazyLock<Regex> = LazyLock::new(|| pattern(r"Queries per second:\s+([\d.]+)"));
static AVG_LATENCY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Average Latency \(s\):\s+([\d.]+)"));
static MIN_LATENCY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Average Latency \(s\):.*\bmin ([\d.]+)"));
static MAX_LATENCY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Average Latency \(s\):.*\bmax ([\d.]+)"));
static LATENCY_STDDEV: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Latency StdDev \(s\):\s+([\d.]+)"));

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("invalid dnsperf field pattern")
}

/// Errors produced while parsing dnsperf output
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A field dnsperf always prints was not found
    #[error("required field '{0}' not found in dnsperf output")]
    MissingField(&'static str),

    /// A field was found but its value is not a number
    #[error("field '{field}' has invalid numeric value '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// Parse one pod's dnsperf output into a [`PerNodeResult`].
///
/// Latencies are converted from seconds to milliseconds. Values keep full
/// precision; rounding only happens during aggregation.
///
/// # Example
/// ```
/// use k8s_dnsperf_common::parse_output;
///
/// let out = "Queries sent: 10\nQueries completed: 9 (90.00%)\n\
///            Queries per second: 2.5\n\
///            Average Latency (s): 0.002 (min 0.001, max 0.004)\n\
///            Latency StdDev (s): 0.001\n";
/// let result = parse_output(out).unwrap();
/// assert_eq!(result.queries_sent, 10);
/// assert_eq!(result.queries_lost, 0);
/// assert_eq!(result.avg_latency_ms, 2.0);
/// ```
pub fn parse_output(raw: &str) -> Result<PerNodeResult, ParseError> {
    Ok(PerNodeResult {
        queries_sent: required(&SENT, "queries sent", raw)?,
        queries_completed: required(&COMPLETED, "queries completed", raw)?,
        queries_lost: optional(&LOST, "queries lost", raw)?.unwrap_or(0),
        queries_interrupted: optional(&INTERRUPTED, "queries interrupted", raw)?.unwrap_or(0),
        qps: required(&QPS, "queries per second", raw)?,
        avg_latency_ms: required::<f64>(&AVG_LATENCY, "average latency", raw)? * MS_PER_SEC,
        min_latency_ms: required::<f64>(&MIN_LATENCY, "min latency", raw)? * MS_PER_SEC,
        max_latency_ms: required::<f64>(&MAX_LATENCY, "max latency", raw)? * MS_PER_SEC,
        latency_stdev_ms: required::<f64>(&LATENCY_STDDEV, "latency stddev", raw)?
            * MS_PER_SEC,
    })
}

fn required<T: FromStr>(re: &Regex, field: &'static str, raw: &str) -> Result<T, ParseError> {
    optional(re, field, raw)?.ok_or(ParseError::MissingField(field))
}

fn optional<T: FromStr>(
    re: &Regex,
    field: &'static str,
    raw: &str,
) -> Result<Option<T>, ParseError> {
    let Some(value) = re.captures(raw).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    value
        .as_str()
        .parse()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.as_str().to_string(),
        })
}
