//! Shared test utilities for k8s-dnsperf
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`fixtures`]: Captured dnsperf output
//! - [`run`]: Unique run IDs and pod names for test resources

pub mod fixtures;
pub mod run;

// Re-export commonly used items
pub use fixtures::{DNSPERF_OUTPUT, dnsperf_output};
pub use run::{init_tracing, pod_name, test_run_id, TEST_RUN_PREFIX};
