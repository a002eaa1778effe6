//! Default configuration values
//!
//! These constants are shared by the CLI and by the manifest builders so the
//! two never disagree.

/// Default node selector for the DaemonSet (every worker node)
pub const DEFAULT_SELECTOR: &str = "node-role.kubernetes.io/worker=";

/// Default number of DNS records (each record is one Service)
pub const DEFAULT_RECORDS: u32 = 1;

/// Default DNS server targeted by dnsperf (OpenShift cluster DNS service IP)
pub const DEFAULT_DNS_SERVER: &str = "172.30.0.10";

/// Default DNS server port
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Default benchmark duration in seconds
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// Default per-query timeout in seconds
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 1;

/// Default number of dnsperf clients per pod
pub const DEFAULT_CLIENTS: u32 = 1;

/// Default time to wait for every DaemonSet pod to become ready (5 minutes)
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 300;

/// Deadline for the whole provisioning step (5 minutes)
pub const PROVISION_TIMEOUT_SECS: u64 = 300;

/// Default search index name
pub const DEFAULT_ES_INDEX: &str = "k8s-dnsperf";

/// Container image that ships the dnsperf binary
pub const DEFAULT_IMAGE: &str = "quay.io/cloud-bulldozer/k8s-dnsperf:latest";

/// Control plane request budget for object creation (requests per second)
pub const CREATE_QPS: u32 = 100;

/// Control plane burst allowance for object creation
pub const CREATE_BURST: u32 = 100;
