//! API client for communicating with the Kubeviz server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use topology_lib::{
    Deployment, Namespace, Node, NodeDetail, Pod, Service, Snapshot, TopologyGraph,
};
use url::Url;

/// API client for the Kubeviz server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str, query: &[(&str, Option<&str>)]) -> Result<Url> {
        let mut url = self.base_url.join(path).context("Invalid path")?;
        let present: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(k, v)| v.map(|v| (*k, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[]).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<&str>)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path, query)?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request without a body
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .post(self.url(path, &[])?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => match err.details {
                    Some(details) => format!("{} ({})", err.error, details),
                    None => err.error,
                },
                Err(_) => body,
            };
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Cluster connectivity; a 503 still carries a status body
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(self.url("api/health", &[])?)
            .send()
            .await
            .context("Failed to send request")?;

        response.json().await.context("Failed to parse response")
    }

    pub async fn nodes(&self) -> Result<Vec<Node>> {
        self.get("api/nodes").await
    }

    pub async fn node(&self, name: &str) -> Result<NodeDetail> {
        self.get(&format!("api/nodes/{}", name)).await
    }

    pub async fn pods(&self, namespace: Option<&str>, node: Option<&str>) -> Result<Vec<Pod>> {
        self.get_with_query("api/pods", &[("namespace", namespace), ("node", node)])
            .await
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>> {
        self.get("api/namespaces").await
    }

    pub async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>> {
        self.get_with_query("api/deployments", &[("namespace", namespace)])
            .await
    }

    pub async fn services(&self, namespace: Option<&str>) -> Result<Vec<Service>> {
        self.get_with_query("api/services", &[("namespace", namespace)])
            .await
    }

    pub async fn topology(&self) -> Result<TopologyGraph> {
        self.get("api/topology").await
    }

    pub async fn refresh(&self) -> Result<RefreshResult> {
        self.post("api/refresh").await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    pub snapshot: Snapshot,
    pub topology: TopologyGraph,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn node_json(name: &str, role: &str, pods: usize) -> serde_json::Value {
        json!({
            "name": name,
            "uid": format!("uid-{}", name),
            "labels": {},
            "role": role,
            "status": "Ready",
            "capacity": {"cpu": "4", "memory": "16Gi", "pods": "110"},
            "allocatable": {"cpu": "3800m", "memory": "15Gi", "pods": "110"},
            "info": {
                "os": "linux",
                "architecture": "amd64",
                "kernel": "6.1.0",
                "container_runtime": "containerd://1.7.2",
                "kubelet_version": "v1.28.4"
            },
            "addresses": [{"type": "InternalIP", "address": "10.0.0.2"}],
            "pods_on_node": pods
        })
    }

    #[tokio::test]
    async fn test_nodes_are_decoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/nodes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([node_json("m1", "master", 0), node_json("w1", "worker", 3)]).to_string())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let nodes = client.nodes().await.unwrap();

        mock.assert_async().await;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].pods_on_node, 3);
        assert_eq!(nodes[1].addresses[0].address_type, "InternalIP");
        assert!(nodes[0].metrics.is_none());
    }

    #[tokio::test]
    async fn test_filters_become_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pods")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("namespace".into(), "shop".into()),
                Matcher::UrlEncoded("node".into(), "w1".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let pods = client.pods(Some("shop"), Some("w1")).await.unwrap();

        mock.assert_async().await;
        assert!(pods.is_empty());
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/nodes/ghost")
            .with_status(404)
            .with_body(r#"{"error":"Node not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.node("ghost").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("Node not found"));
    }

    #[tokio::test]
    async fn test_health_reads_unavailable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(503)
            .with_body(r#"{"status":"unhealthy","message":"Not connected to cluster"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();

        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.message, "Not connected to cluster");
    }

    #[tokio::test]
    async fn test_refresh_posts() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "snapshot": {
                "nodes": [node_json("w1", "worker", 0)],
                "namespaces": [],
                "pods": [],
                "deployments": [],
                "services": [],
                "metrics_available": false,
                "taken_at": "2024-05-01T10:00:00Z"
            },
            "topology": {
                "vertices": [{"id": "w1", "role": "worker", "status": "Ready", "pods_on_node": 0}],
                "edges": []
            }
        });
        let mock = server
            .mock("POST", "/api/refresh")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result = client.refresh().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.snapshot.data.nodes.len(), 1);
        assert!(result.snapshot.failures.is_empty());
        assert!(result.topology.edges.is_empty());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
