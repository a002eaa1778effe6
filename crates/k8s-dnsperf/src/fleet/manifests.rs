//! Object manifests for a benchmark fleet
//!
//! Pure builders: every object is derived from the [`FleetSpec`] on each call.

use std::collections::BTreeMap;

use k8s_dnsperf_common::labels::{
    APP_LABEL, APP_NAME, KUBERNETES_DEFAULT_FQDN, RECORDS_CONFIG_MAP, RECORDS_KEY, RECORDS_PATH,
    RUN_ID_LABEL,
};
use k8s_dnsperf_common::RecordType;
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, Namespace, PodSpec, PodTemplateSpec, Service,
    ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::types::FleetSpec;

/// Port exposed by every target Service
const SERVICE_PORT: i32 = 80;

fn app_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), APP_NAME.to_string())])
}

fn run_labels(spec: &FleetSpec) -> BTreeMap<String, String> {
    let mut labels = app_labels();
    labels.insert(RUN_ID_LABEL.to_string(), spec.run_id.clone());
    labels
}

pub fn namespace(spec: &FleetSpec) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(spec.namespace.clone()),
            labels: Some(run_labels(spec)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The `n`-th target Service, a ClusterIP with no backing pods.
pub fn service(spec: &FleetSpec, n: u32) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(k8s_dnsperf_common::labels::service_name(n)),
            namespace: Some(spec.namespace.clone()),
            labels: Some(app_labels()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            ports: Some(vec![ServicePort {
                port: SERVICE_PORT,
                target_port: Some(IntOrString::Int(SERVICE_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// dnsperf input file: the kubernetes service name followed by every
/// Service FQDN, one `<name> <TYPE>` query per line.
pub fn record_list(fqdns: &[String], record_type: RecordType) -> String {
    std::iter::once(KUBERNETES_DEFAULT_FQDN)
        .chain(fqdns.iter().map(String::as_str))
        .map(|name| format!("{name} {record_type}\n"))
        .collect()
}

pub fn records_config_map(spec: &FleetSpec, records: String) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(RECORDS_CONFIG_MAP.to_string()),
            namespace: Some(spec.namespace.clone()),
            labels: Some(app_labels()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(RECORDS_KEY.to_string(), records)])),
        ..Default::default()
    }
}

/// The benchmark DaemonSet: one idle dnsperf pod per selected node, with the
/// record list mounted at `/records`.
pub fn daemon_set(spec: &FleetSpec) -> DaemonSet {
    let node_selector = (!spec.node_selector.is_empty()).then(|| spec.node_selector.as_map().clone());

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(APP_NAME.to_string()),
            namespace: Some(spec.namespace.clone()),
            labels: Some(app_labels()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(app_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(run_labels(spec)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    termination_grace_period_seconds: Some(0),
                    node_selector,
                    containers: vec![Container {
                        name: APP_NAME.to_string(),
                        image: Some(spec.image.clone()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: RECORDS_CONFIG_MAP.to_string(),
                            mount_path: RECORDS_PATH.to_string(),
                            sub_path: Some(RECORDS_KEY.to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: RECORDS_CONFIG_MAP.to_string(),
                        config_map: Some(ConfigMapVolumeSource {
                            name: RECORDS_CONFIG_MAP.to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
