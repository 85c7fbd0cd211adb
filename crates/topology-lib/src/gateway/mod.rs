//! Typed access to the cluster control API
//!
//! The aggregator only ever talks to the cluster through [`ClusterGateway`],
//! so the production client and the in-memory test gateway are interchangeable.

mod kube_client;

pub use kube_client::KubeGateway;

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta};
use serde::{Deserialize, Serialize};

/// Read-only list operations against the cluster API
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Pods across all namespaces
    async fn list_pods(&self) -> Result<Vec<Pod>>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>>;

    /// Deployments across all namespaces
    async fn list_deployments(&self) -> Result<Vec<Deployment>>;

    /// Services across all namespaces
    async fn list_services(&self) -> Result<Vec<Service>>;

    /// Node usage from `metrics.k8s.io`. Clusters without metrics-server
    /// return an error here, which callers must tolerate.
    async fn node_metrics(&self) -> Result<Vec<NodeMetrics>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetricsUsage {
    pub cpu: Quantity,
    pub memory: Quantity,
}

/// `metrics.k8s.io/v1beta1` NodeMetrics object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    pub usage: NodeMetricsUsage,
}

impl k8s_openapi::Resource for NodeMetrics {
    type Scope = k8s_openapi::ClusterResourceScope;

    const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
    const GROUP: &'static str = "metrics.k8s.io";
    const KIND: &'static str = "NodeMetrics";
    const URL_PATH_SEGMENT: &'static str = "nodes";
    const VERSION: &'static str = "v1beta1";
}

impl k8s_openapi::Metadata for NodeMetrics {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &Self::Ty {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Self::Ty {
        &mut self.metadata
    }
}
