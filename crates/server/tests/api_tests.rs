//! Integration tests for the server API endpoints

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use kubeviz_server::api::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use topology_lib::{
    health::{components, HealthRegistry},
    observability::TopologyMetrics,
    snapshot::CONTROL_PLANE_LABEL,
    testing::{deployment, namespace, node, node_metrics, pod, service, FakeGateway},
    AggregatorConfig, ResourceKind, SnapshotAggregator,
};
use tower::ServiceExt;

fn cluster() -> FakeGateway {
    FakeGateway::new()
        .with_nodes(vec![
            node("m1", &[(CONTROL_PLANE_LABEL, "")], true),
            node("w1", &[], true),
            node("w2", &[], true),
        ])
        .with_pods(vec![
            pod("api-0", "shop", Some("w1")),
            pod("api-1", "shop", Some("w2")),
            pod("worker-0", "jobs", Some("w1")),
            pod("worker-1", "jobs", Some("w2")),
        ])
        .with_namespaces(vec![namespace("shop"), namespace("jobs")])
        .with_deployments(vec![
            deployment("shop", "api", 2, 2),
            deployment("jobs", "worker", 2, 1),
        ])
        .with_services(vec![service("shop", "api")])
        .with_metrics(vec![node_metrics("w1", "250m", "1Gi")])
}

async fn setup_test_app(gateway: Option<FakeGateway>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::GATEWAY).await;
    health_registry.register(components::METRICS_API).await;

    let config = AggregatorConfig {
        fetch_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let aggregator = gateway.map(|g| SnapshotAggregator::new(Arc::new(g), config));

    let state = Arc::new(AppState::new(
        aggregator,
        health_registry,
        TopologyMetrics::new(),
        CancellationToken::new(),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::GET, uri).await
}

#[tokio::test]
async fn test_cluster_returns_full_snapshot() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/cluster").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["pods"].as_array().unwrap().len(), 4);
    assert_eq!(body["namespaces"].as_array().unwrap().len(), 2);
    assert_eq!(body["deployments"].as_array().unwrap().len(), 2);
    assert_eq!(body["services"].as_array().unwrap().len(), 1);
    assert_eq!(body["metrics_available"], true);
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_nodes_carry_role_count_and_metrics() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/nodes").await;

    assert_eq!(status, StatusCode::OK);
    let nodes = body.as_array().unwrap();
    assert_eq!(nodes[0]["name"], "m1");
    assert_eq!(nodes[0]["role"], "master");
    assert_eq!(nodes[0]["status"], "Ready");
    assert_eq!(nodes[1]["role"], "worker");
    assert_eq!(nodes[1]["pods_on_node"], 2);
    assert_eq!(nodes[1]["metrics"]["cpu"], "250m");
    assert!(nodes[2].get("metrics").is_none());
}

#[tokio::test]
async fn test_node_detail_lists_hosted_pods() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/nodes/w2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "w2");
    let pods: Vec<&str> = body["pods_details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(pods, vec!["api-1", "worker-1"]);
}

#[tokio::test]
async fn test_unknown_node_returns_404() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/nodes/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Node not found");
}

#[tokio::test]
async fn test_list_filters() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (_, pods) = get(app.clone(), "/api/pods?namespace=jobs&node=w1").await;
    let pods = pods.as_array().unwrap();
    assert_eq!(pods.len(), 1);
    assert_eq!(pods[0]["name"], "worker-0");

    let (_, deployments) = get(app.clone(), "/api/deployments?namespace=shop").await;
    assert_eq!(deployments.as_array().unwrap().len(), 1);

    let (_, services) = get(app, "/api/services?namespace=jobs").await;
    assert!(services.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_shapes() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (_, namespaces) = get(app.clone(), "/api/namespaces").await;
    assert_eq!(namespaces[0]["status"], "Active");

    let (_, deployments) = get(app.clone(), "/api/deployments").await;
    assert_eq!(deployments[1]["name"], "worker");
    assert_eq!(deployments[1]["available_replicas"], 1);

    let (_, services) = get(app, "/api/services").await;
    assert_eq!(services[0]["type"], "ClusterIP");
    assert_eq!(services[0]["selector"]["app"], "api");
}

#[tokio::test]
async fn test_topology_fans_out_from_master() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/topology").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vertices"].as_array().unwrap().len(), 3);
    let edges = body["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0]["from"], "m1");
    assert_eq!(edges[0]["to"], "w1");
    assert_eq!(edges[1]["to"], "w2");
}

#[tokio::test]
async fn test_refresh_returns_snapshot_and_topology() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = send(app, Method::POST, "/api/refresh").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["topology"]["edges"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_partial_failure_is_reported_as_warning() {
    let (app, state) = setup_test_app(Some(cluster().failing(ResourceKind::Pods))).await;

    let (status, body) = get(app, "/api/cluster").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["pods"].as_array().unwrap().is_empty());
    assert_eq!(body["nodes"][1]["pods_on_node"], 0);
    assert_eq!(body["warnings"][0]["kind"], "pods");

    let gateway = state
        .health_registry
        .component(components::GATEWAY)
        .await
        .unwrap();
    assert_eq!(gateway.message.as_deref(), Some("Failed to fetch: pods"));
}

#[tokio::test]
async fn test_total_failure_returns_502() {
    let gateway = cluster()
        .failing(ResourceKind::Nodes)
        .failing(ResourceKind::Pods)
        .failing(ResourceKind::Namespaces)
        .failing(ResourceKind::Deployments)
        .failing(ResourceKind::Services);
    let (app, _state) = setup_test_app(Some(gateway)).await;

    let (status, body) = get(app.clone(), "/api/cluster").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("nodes:"));

    let (status, _) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_without_gateway_data_routes_return_503() {
    let (app, _state) = setup_test_app(None).await;

    for uri in ["/api/cluster", "/api/nodes", "/api/nodes/w1", "/api/topology"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        assert_eq!(body["error"], "Cluster analyzer not initialized");
    }

    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_api_health_when_connected() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, body) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "Connected to cluster");
}

#[tokio::test]
async fn test_shutdown_cancels_requests() {
    let (app, state) = setup_test_app(Some(cluster())).await;
    state.shutdown.cancel();

    let (status, body) = get(app, "/api/cluster").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Snapshot build cancelled");
}

#[tokio::test]
async fn test_healthz_degraded_without_metrics_api() {
    let gateway = cluster().failing(ResourceKind::NodeMetrics);
    let (app, _state) = setup_test_app(Some(gateway)).await;

    let (status, _) = get(app.clone(), "/api/nodes").await;
    assert_eq!(status, StatusCode::OK);

    // Degraded still returns 200 (operational)
    let (status, health) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["metrics_api"]["status"], "degraded");
    assert_eq!(health["components"]["cluster_gateway"]["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(Some(cluster())).await;

    state
        .health_registry
        .set_unhealthy(components::GATEWAY, "connection refused")
        .await;

    let (status, health) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    // By default, the server is not ready
    let (status, readiness) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app(Some(cluster())).await;
    state.health_registry.set_ready(true).await;

    let (status, readiness) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app(Some(cluster())).await;

    let (status, _) = get(app.clone(), "/api/cluster").await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("kubeviz_snapshot_build_latency_seconds_bucket"));
    assert!(metrics_text.contains("kubeviz_snapshots_built_total"));
    assert!(metrics_text.contains("kubeviz_cluster_nodes"));
}
