//! HTTP API for cluster data, topology, health checks and Prometheus metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use topology_lib::{
    build_graph,
    health::{components, ComponentStatus, HealthRegistry},
    observability::TopologyMetrics,
    resolve_node_detail, Snapshot, SnapshotAggregator, TopologyError, TopologyGraph,
};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` when no cluster client could be built at startup
    pub aggregator: Option<SnapshotAggregator>,
    pub health_registry: HealthRegistry,
    pub metrics: TopologyMetrics,
    /// Root token; every request builds under a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        aggregator: Option<SnapshotAggregator>,
        health_registry: HealthRegistry,
        metrics: TopologyMetrics,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            aggregator,
            health_registry,
            metrics,
            shutdown,
        }
    }

    /// Build a fresh snapshot and fold the outcome into component health
    async fn snapshot(&self) -> Result<Snapshot, ApiError> {
        let aggregator = self.aggregator.as_ref().ok_or_else(|| {
            TopologyError::GatewayUnavailable("Cluster analyzer not initialized".to_string())
        })?;

        let cancel = self.shutdown.child_token();
        let outcome = aggregator.build_snapshot(&cancel).await;
        self.health_registry.record_snapshot(&outcome).await;

        Ok(outcome?)
    }
}

/// JSON error body: `{error, details?}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError(TopologyError);

impl From<TopologyError> for ApiError {
    fn from(err: TopologyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            TopologyError::NotFound(_) => StatusCode::NOT_FOUND,
            TopologyError::GatewayUnavailable(_) | TopologyError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TopologyError::AggregationFailed { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = match &err {
            TopologyError::NotFound(_) => ErrorBody {
                error: "Node not found".to_string(),
                details: None,
            },
            TopologyError::GatewayUnavailable(reason) => ErrorBody {
                error: reason.clone(),
                details: None,
            },
            _ => ErrorBody {
                error: err.to_string(),
                details: err.details(),
            },
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %err, "Request failed");
        }

        (status, Json(body)).into_response()
    }
}

/// Optional narrowing for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub namespace: Option<String>,
    pub node: Option<String>,
}

impl ListFilter {
    fn keeps(&self, namespace: &str, node: Option<&str>) -> bool {
        let namespace_ok = self.namespace.as_deref().map_or(true, |ns| ns == namespace);
        let node_ok = self.node.as_deref().map_or(true, |n| node == Some(n));
        namespace_ok && node_ok
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectivityResponse {
    pub status: ComponentStatus,
    pub message: String,
}

/// Snapshot and topology computed in one refresh cycle
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub snapshot: Snapshot,
    pub topology: TopologyGraph,
}

/// Cluster connectivity - 200 while the gateway is operational, 503 otherwise
async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.aggregator.is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ConnectivityResponse {
                status: ComponentStatus::Unhealthy,
                message: "Not connected to cluster".to_string(),
            }),
        );
    }

    match state.health_registry.component(components::GATEWAY).await {
        Some(gateway) if !gateway.status.is_operational() => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ConnectivityResponse {
                status: ComponentStatus::Unhealthy,
                message: gateway
                    .message
                    .unwrap_or_else(|| "Cluster API unreachable".to_string()),
            }),
        ),
        _ => (
            StatusCode::OK,
            Json(ConnectivityResponse {
                status: ComponentStatus::Healthy,
                message: "Connected to cluster".to_string(),
            }),
        ),
    }
}

async fn cluster(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.snapshot().await?))
}

async fn nodes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.snapshot().await?.data.nodes))
}

async fn node_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.snapshot().await?;
    Ok(Json(resolve_node_detail(&snapshot.data, &name)?))
}

async fn pods(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut pods = state.snapshot().await?.data.pods;
    pods.retain(|p| filter.keeps(&p.namespace, p.node_name()));
    Ok(Json(pods))
}

async fn namespaces(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.snapshot().await?.data.namespaces))
}

async fn deployments(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut deployments = state.snapshot().await?.data.deployments;
    deployments.retain(|d| filter.keeps(&d.namespace, None));
    Ok(Json(deployments))
}

async fn services(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut services = state.snapshot().await?.data.services;
    services.retain(|s| filter.keeps(&s.namespace, None));
    Ok(Json(services))
}

async fn topology(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.snapshot().await?;
    Ok(Json(build_graph(&snapshot.data.nodes)))
}

async fn refresh(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.snapshot().await?;
    let topology = build_graph(&snapshot.data.nodes);
    Ok(Json(RefreshResponse { snapshot, topology }))
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/cluster", get(cluster))
        .route("/api/nodes", get(nodes))
        .route("/api/nodes/:name", get(node_detail))
        .route("/api/pods", get(pods))
        .route("/api/namespaces", get(namespaces))
        .route("/api/deployments", get(deployments))
        .route("/api/services", get(services))
        .route("/api/topology", get(topology))
        .route("/api/refresh", post(refresh))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server, stopping when the shutdown token fires
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
