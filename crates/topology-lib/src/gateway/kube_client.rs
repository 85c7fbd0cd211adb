//! Gateway backed by a `kube` client

use super::{ClusterGateway, NodeMetrics};
use crate::error::TopologyError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use kube::api::{Api, ListParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info};

/// Gateway over the Kubernetes API server
///
/// Credentials come from the usual kubeconfig / in-cluster resolution
/// performed by [`Client::try_default`].
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient kubeconfig or in-cluster environment
    pub async fn connect() -> std::result::Result<Self, TopologyError> {
        let client = Client::try_default()
            .await
            .map_err(|e| TopologyError::GatewayUnavailable(e.to_string()))?;

        info!(
            default_namespace = %client.default_namespace(),
            "Connected to cluster API"
        );
        Ok(Self::new(client))
    }

    async fn list_all<K>(&self, what: &str) -> Result<Vec<K>>
    where
        K: kube::Resource + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list {}", what))?;

        debug!(kind = what, count = list.items.len(), "Listed resources");
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list_all("nodes").await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.list_all("pods").await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        self.list_all("namespaces").await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.list_all("deployments").await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.list_all("services").await
    }

    async fn node_metrics(&self) -> Result<Vec<NodeMetrics>> {
        self.list_all("node metrics").await
    }
}
