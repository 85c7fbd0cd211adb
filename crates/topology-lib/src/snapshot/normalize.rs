//! Conversion of raw API objects into the snapshot data model

use super::pods::{container_ready, restart_count, PodIndex};
use super::roles::RoleClassifier;
use crate::models::{
    Container, Deployment, Namespace, Node, NodeAddress, NodeInfo, NodeStatus, Pod,
    ResourceQuantities, Service, ServicePort,
};
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::collections::BTreeMap;

fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> ResourceQuantities {
    let get = |key: &str| {
        map.and_then(|m| m.get(key))
            .map(|q| q.0.clone())
            .unwrap_or_else(|| "0".to_string())
    };
    ResourceQuantities {
        cpu: get("cpu"),
        memory: get("memory"),
        pods: get("pods"),
    }
}

fn node_status(status: Option<&core::NodeStatus>) -> NodeStatus {
    let ready = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map(|c| c.status == "True")
        .unwrap_or(false);

    if ready {
        NodeStatus::Ready
    } else {
        NodeStatus::NotReady
    }
}

/// Build a node record; the pod count comes from the already-built pod index
pub fn normalize_node(raw: &core::Node, classifier: &RoleClassifier, pods: &PodIndex<'_>) -> Node {
    let name = raw.name_any();
    let labels = raw.labels().clone();
    let status = raw.status.as_ref();
    let info = status
        .and_then(|s| s.node_info.as_ref())
        .map(|i| NodeInfo {
            os: i.operating_system.clone(),
            architecture: i.architecture.clone(),
            kernel: i.kernel_version.clone(),
            container_runtime: i.container_runtime_version.clone(),
            kubelet_version: i.kubelet_version.clone(),
        })
        .unwrap_or_default();
    let addresses = status
        .and_then(|s| s.addresses.as_ref())
        .map(|addrs| {
            addrs
                .iter()
                .map(|a| NodeAddress {
                    address_type: a.type_.clone(),
                    address: a.address.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Node {
        uid: raw.uid().unwrap_or_default(),
        role: classifier.classify(&labels),
        status: node_status(status),
        capacity: quantities(status.and_then(|s| s.capacity.as_ref())),
        allocatable: quantities(status.and_then(|s| s.allocatable.as_ref())),
        info,
        addresses,
        pods_on_node: pods.count(&name),
        metrics: None,
        labels,
        name,
    }
}

pub fn normalize_pod(raw: &core::Pod) -> Pod {
    let status = raw.status.as_ref();
    let containers = raw
        .spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .map(|c| Container {
                    name: c.name.clone(),
                    image: c.image.clone().unwrap_or_default(),
                    ready: container_ready(status, &c.name),
                })
                .collect()
        })
        .unwrap_or_default();

    Pod {
        name: raw.name_any(),
        namespace: raw.namespace().unwrap_or_default(),
        uid: raw.uid().unwrap_or_default(),
        node: raw
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .filter(|n| !n.is_empty()),
        status: status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        ip: status.and_then(|s| s.pod_ip.clone()),
        labels: raw.labels().clone(),
        containers,
        restart_count: restart_count(status),
    }
}

pub fn normalize_namespace(raw: &core::Namespace) -> Namespace {
    Namespace {
        name: raw.name_any(),
        uid: raw.uid().unwrap_or_default(),
        status: raw
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        labels: raw.labels().clone(),
        creation_timestamp: raw.creation_timestamp().map(|t| t.0.to_rfc3339()),
    }
}

pub fn normalize_deployment(raw: &apps::Deployment) -> Deployment {
    let status = raw.status.as_ref();
    Deployment {
        name: raw.name_any(),
        namespace: raw.namespace().unwrap_or_default(),
        uid: raw.uid().unwrap_or_default(),
        replicas: raw.spec.as_ref().and_then(|s| s.replicas),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        labels: raw.labels().clone(),
    }
}

pub fn normalize_service(raw: &core::Service) -> Service {
    let spec = raw.spec.as_ref();
    let ports = spec
        .and_then(|s| s.ports.as_ref())
        .map(|ports| {
            ports
                .iter()
                .map(|p| ServicePort {
                    port: p.port,
                    target_port: match &p.target_port {
                        Some(IntOrString::Int(port)) => port.to_string(),
                        Some(IntOrString::String(name)) => name.clone(),
                        None => p.port.to_string(),
                    },
                    protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Service {
        name: raw.name_any(),
        namespace: raw.namespace().unwrap_or_default(),
        uid: raw.uid().unwrap_or_default(),
        service_type: spec
            .and_then(|s| s.type_.clone())
            .unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()),
        ports,
        labels: raw.labels().clone(),
        selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
    }
}
