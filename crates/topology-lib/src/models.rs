//! Core data models for cluster snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label mapping as carried by Kubernetes object metadata
pub type Labels = BTreeMap<String, String>;

/// Node role derived from control-plane marker labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node readiness derived from the `Ready` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Ready => "Ready",
            NodeStatus::NotReady => "NotReady",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque resource quantities (cpu, memory, pod count) as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
    pub pods: String,
}

impl Default for ResourceQuantities {
    fn default() -> Self {
        Self {
            cpu: "0".to_string(),
            memory: "0".to_string(),
            pods: "0".to_string(),
        }
    }
}

/// System information reported by the kubelet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub os: String,
    pub architecture: String,
    pub kernel: String,
    pub container_runtime: String,
    pub kubelet_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: String,
    pub address: String,
}

/// Live usage from the metrics API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUsage {
    pub cpu: String,
    pub memory: String,
}

/// A cluster member machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub uid: String,
    pub labels: Labels,
    pub role: Role,
    pub status: NodeStatus,
    pub capacity: ResourceQuantities,
    pub allocatable: ResourceQuantities,
    pub info: NodeInfo,
    pub addresses: Vec<NodeAddress>,
    pub pods_on_node: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NodeUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub ready: bool,
}

/// A scheduled (or pending) pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    /// Owning node; `None` while the pod is unscheduled
    pub node: Option<String>,
    pub status: String,
    pub ip: Option<String>,
    pub labels: Labels,
    pub containers: Vec<Container>,
    pub restart_count: u32,
}

impl Pod {
    /// Owning node name, treating an empty string as unscheduled
    pub fn node_name(&self) -> Option<&str> {
        self.node.as_deref().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub uid: String,
    pub status: String,
    pub labels: Labels,
    pub creation_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub replicas: Option<i32>,
    pub available_replicas: i32,
    pub ready_replicas: i32,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: i32,
    pub target_port: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub cluster_ip: Option<String>,
    pub ports: Vec<ServicePort>,
    pub labels: Labels,
    pub selector: Labels,
}

/// Resource kinds fetched while building a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Nodes,
    Pods,
    Namespaces,
    Deployments,
    Services,
    NodeMetrics,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Nodes => "nodes",
            ResourceKind::Pods => "pods",
            ResourceKind::Namespaces => "namespaces",
            ResourceKind::Deployments => "deployments",
            ResourceKind::Services => "services",
            ResourceKind::NodeMetrics => "node_metrics",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource kind that could not be fetched for a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFailure {
    pub kind: ResourceKind,
    pub cause: String,
}

/// All normalized resources of one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    pub nodes: Vec<Node>,
    pub namespaces: Vec<Namespace>,
    pub pods: Vec<Pod>,
    pub deployments: Vec<Deployment>,
    pub services: Vec<Service>,
}

impl ClusterData {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// An immutable view of cluster state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub data: ClusterData,
    #[serde(rename = "warnings", default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PartialFailure>,
    pub metrics_available: bool,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether any resource kind is missing from this snapshot
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed(&self, kind: ResourceKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }
}

/// A node together with the full detail of the pods it hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: Node,
    pub pods_details: Vec<Pod>,
}
