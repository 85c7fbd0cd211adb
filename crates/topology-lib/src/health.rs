//! Health tracking for the cluster gateway and the metrics capability
//!
//! Backs the liveness/readiness probes and the `/api/health` check.

use crate::error::TopologyError;
use crate::models::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operating with reduced data (some resource kind or metrics missing)
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .fold(ComponentStatus::Healthy, |worst, status| match (worst, status) {
                (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                    ComponentStatus::Unhealthy
                }
                (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                    ComponentStatus::Degraded
                }
                _ => ComponentStatus::Healthy,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const GATEWAY: &str = "cluster_gateway";
    pub const METRICS_API: &str = "metrics_api";
}

#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Fold the outcome of a snapshot build into component health
    pub async fn record_snapshot(&self, outcome: &Result<Snapshot, TopologyError>) {
        match outcome {
            Ok(snapshot) => {
                if snapshot.is_degraded() {
                    let kinds: Vec<&str> = snapshot.failures.iter().map(|f| f.kind.as_str()).collect();
                    self.set_degraded(
                        components::GATEWAY,
                        format!("Failed to fetch: {}", kinds.join(", ")),
                    )
                    .await;
                } else {
                    self.set_healthy(components::GATEWAY).await;
                }

                if snapshot.metrics_available {
                    self.set_healthy(components::METRICS_API).await;
                } else {
                    self.set_degraded(components::METRICS_API, "Node metrics API unavailable")
                        .await;
                }
            }
            Err(err @ TopologyError::AggregationFailed { .. })
            | Err(err @ TopologyError::GatewayUnavailable(_)) => {
                self.set_unhealthy(components::GATEWAY, err.to_string()).await;
            }
            // Cancellation and lookups say nothing about cluster health
            Err(_) => {}
        }
    }

    pub async fn component(&self, name: &str) -> Option<ComponentHealth> {
        self.components.read().await.get(name).cloned()
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let gateway = self.component(components::GATEWAY).await;

        let reason = if !ready {
            Some("Server not yet initialized".to_string())
        } else {
            match gateway {
                None => Some("Cluster gateway not registered".to_string()),
                Some(h) if !h.status.is_operational() => Some(
                    h.message
                        .unwrap_or_else(|| "Cluster gateway unhealthy".to_string()),
                ),
                Some(_) => None,
            }
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}
