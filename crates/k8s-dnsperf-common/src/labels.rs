//! Object names and labels for k8s-dnsperf resources
//!
//! Every object the tool creates lives in one namespace and carries the
//! `app=k8s-dnsperf` label so Services and pods can be listed by selector.
//!
//! | Object | Name |
//! |--------|------|
//! | Namespace | `k8s-dnsperf` |
//! | Service | `k8s-dnsperf-<n>` |
//! | ConfigMap | `dnsperf-records` |
//! | DaemonSet | `k8s-dnsperf` |

/// Tool name, also used as namespace, DaemonSet and container name
pub const APP_NAME: &str = "k8s-dnsperf";

/// Label key used on every created object
pub const APP_LABEL: &str = "app";

/// Label key carrying the run identifier
pub const RUN_ID_LABEL: &str = "k8s-dnsperf/run-id";

/// ConfigMap holding the generated record list
pub const RECORDS_CONFIG_MAP: &str = "dnsperf-records";

/// Key inside the ConfigMap and volume sub-path
pub const RECORDS_KEY: &str = "records";

/// Mount path of the record list inside the container
pub const RECORDS_PATH: &str = "/records";

/// Cluster-internal name that always resolves
pub const KUBERNETES_DEFAULT_FQDN: &str = "kubernetes.default.svc.cluster.local";

/// Label selector matching every created object
pub fn app_selector() -> String {
    format!("{}={}", APP_LABEL, APP_NAME)
}

/// Name of the n-th target Service
pub fn service_name(n: u32) -> String {
    format!("{}-{}", APP_NAME, n)
}

/// Fully-qualified cluster DNS name of a Service
pub fn service_fqdn(name: &str, namespace: &str) -> String {
    format!("{}.{}.svc.cluster.local", name, namespace)
}
