//! k8s-dnsperf-common - Shared types and pure result processing
//!
//! This crate holds everything that does not need to talk to a cluster:
//! the per-node and summary result records, the dnsperf output parser and
//! the aggregation rules. It has no Kubernetes dependencies so it can be
//! tested in isolation.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`labels`]: Object names and labels shared by all created resources
//! - [`parse`]: dnsperf output parser
//! - [`record_type`]: DNS record type queried by the benchmark
//! - [`result`]: Per-node and summary result records
//! - [`stats`]: Reduction of per-node results into one summary

pub mod defaults;
pub mod labels;
pub mod parse;
pub mod record_type;
pub mod result;
pub mod stats;

// Re-export commonly used types
pub use parse::{ParseError, parse_output};
pub use record_type::RecordType;
pub use result::{PerNodeResult, RunMetadata, SummaryResult};
pub use stats::{AggregateError, floor_hundredths, reduce};
