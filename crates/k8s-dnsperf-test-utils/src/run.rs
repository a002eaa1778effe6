//! Run identifiers and naming for test resources

use std::sync::Once;

use uuid::Uuid;

/// Prefix that marks a run id as coming from the test suite
pub const TEST_RUN_PREFIX: &str = "dnsperf-test-";

static TRACING: Once = Once::new();

/// A fresh run id shaped like a real one (a v4 UUID) but marked as a test
/// run, so stray objects left by a failed test are easy to spot by label.
///
/// ```
/// use k8s_dnsperf_test_utils::run::{test_run_id, TEST_RUN_PREFIX};
///
/// let run_id = test_run_id();
/// assert!(run_id.starts_with(TEST_RUN_PREFIX));
/// ```
pub fn test_run_id() -> String {
    format!("{TEST_RUN_PREFIX}{}", Uuid::new_v4())
}

/// Name of the n-th fake DaemonSet pod
pub fn pod_name(n: usize) -> String {
    format!("k8s-dnsperf-{:05}", n)
}

/// Install a test tracing subscriber (once per process).
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
