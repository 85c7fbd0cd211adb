//! In-memory gateway and raw object builders for tests
//!
//! Enabled for this crate's unit tests and, through the `test-util` feature,
//! for integration tests of dependent crates.

use crate::gateway::{ClusterGateway, NodeMetrics, NodeMetricsUsage};
use crate::models::ResourceKind;
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::{
    Container, Namespace, NamespaceStatus, Node, NodeCondition, NodeStatus, NodeSystemInfo, Pod,
    PodSpec, PodStatus, Service, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        uid: Some(format!("uid-{}", name)),
        ..Default::default()
    }
}

fn quantity_map(cpu: &str, memory: &str, pods: &str) -> BTreeMap<String, Quantity> {
    [("cpu", cpu), ("memory", memory), ("pods", pods)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
        .collect()
}

/// A node with 4 CPUs / 16Gi, running linux and kubelet v1.28.4
pub fn node(name: &str, labels: &[(&str, &str)], ready: bool) -> Node {
    let mut metadata = meta(name, None);
    metadata.labels = Some(
        labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    Node {
        metadata,
        status: Some(NodeStatus {
            capacity: Some(quantity_map("4", "16Gi", "110")),
            allocatable: Some(quantity_map("3800m", "15Gi", "110")),
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            node_info: Some(NodeSystemInfo {
                operating_system: "linux".to_string(),
                architecture: "amd64".to_string(),
                kernel_version: "6.1.0".to_string(),
                container_runtime_version: "containerd://1.7.2".to_string(),
                kubelet_version: "v1.28.4".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A running single-container pod, scheduled on `node` when given
pub fn pod(name: &str, namespace: &str, node: Option<&str>) -> Pod {
    Pod {
        metadata: meta(name, Some(namespace)),
        spec: Some(PodSpec {
            node_name: node.map(str::to_string),
            containers: vec![Container {
                name: "app".to_string(),
                image: Some("nginx:1.25".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some(if node.is_some() { "Running" } else { "Pending" }.to_string()),
            pod_ip: node.map(|_| "10.244.0.10".to_string()),
            ..Default::default()
        }),
    }
}

pub fn namespace(name: &str) -> Namespace {
    let mut metadata = meta(name, None);
    metadata.creation_timestamp = Some(Time(Utc::now()));
    Namespace {
        metadata,
        status: Some(NamespaceStatus {
            phase: Some("Active".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn deployment(namespace: &str, name: &str, replicas: i32, available: i32) -> Deployment {
    Deployment {
        metadata: meta(name, Some(namespace)),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            available_replicas: Some(available),
            ready_replicas: Some(available),
            ..Default::default()
        }),
    }
}

pub fn service(namespace: &str, name: &str) -> Service {
    Service {
        metadata: meta(name, Some(namespace)),
        spec: Some(ServiceSpec {
            cluster_ip: Some("10.96.0.10".to_string()),
            selector: Some(BTreeMap::from([("app".to_string(), name.to_string())])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn node_metrics(name: &str, cpu: &str, memory: &str) -> NodeMetrics {
    NodeMetrics {
        metadata: meta(name, None),
        timestamp: None,
        window: Some("30s".to_string()),
        usage: NodeMetricsUsage {
            cpu: Quantity(cpu.to_string()),
            memory: Quantity(memory.to_string()),
        },
    }
}

/// Gateway serving fixed objects, with per-kind failures and delays
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    nodes: Vec<Node>,
    pods: Vec<Pod>,
    namespaces: Vec<Namespace>,
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    metrics: Option<Vec<NodeMetrics>>,
    failing: HashSet<ResourceKind>,
    delays: HashMap<ResourceKind, Duration>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_pods(mut self, pods: Vec<Pod>) -> Self {
        self.pods = pods;
        self
    }

    pub fn with_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_deployments(mut self, deployments: Vec<Deployment>) -> Self {
        self.deployments = deployments;
        self
    }

    pub fn with_services(mut self, services: Vec<Service>) -> Self {
        self.services = services;
        self
    }

    /// Serve node metrics; without this the metrics API behaves as not installed
    pub fn with_metrics(mut self, metrics: Vec<NodeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn failing(mut self, kind: ResourceKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn delayed(mut self, kind: ResourceKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    async fn respond<T: Clone>(&self, kind: ResourceKind, items: &[T]) -> Result<Vec<T>> {
        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&kind) {
            bail!("listing {} failed: 500 Internal Server Error", kind);
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl ClusterGateway for FakeGateway {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.respond(ResourceKind::Nodes, &self.nodes).await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.respond(ResourceKind::Pods, &self.pods).await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        self.respond(ResourceKind::Namespaces, &self.namespaces).await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.respond(ResourceKind::Deployments, &self.deployments)
            .await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.respond(ResourceKind::Services, &self.services).await
    }

    async fn node_metrics(&self) -> Result<Vec<NodeMetrics>> {
        match &self.metrics {
            Some(metrics) => self.respond(ResourceKind::NodeMetrics, metrics).await,
            None => bail!("the server could not find the requested resource (get nodes.metrics.k8s.io)"),
        }
    }
}
