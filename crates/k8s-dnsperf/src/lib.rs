//! k8s-dnsperf - fleet-wide DNS benchmark orchestrator
//!
//! Deploys a dnsperf DaemonSet across the selected nodes of a Kubernetes
//! cluster, runs dnsperf in every pod concurrently, and aggregates the
//! per-pod statistics into one cluster-wide summary.

pub mod cluster;
pub mod config;
pub mod error;
pub mod fleet;
pub mod orchestrator;
pub mod sink;
pub mod wait;
