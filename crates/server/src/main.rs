//! Kubeviz server
//!
//! Serves cluster snapshots, node detail and the derived topology graph to
//! the dashboard front-end. Every data request reads the cluster afresh.

use anyhow::Result;
use kubeviz_server::{api, config::ServerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use topology_lib::{
    health::{components, HealthRegistry},
    observability::{StructuredLogger, TopologyMetrics},
    KubeGateway, SnapshotAggregator,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting kubeviz-server");

    let config = ServerConfig::load()?;
    info!(
        cluster = %config.cluster_name,
        port = config.api_port,
        markers = ?config.control_plane_labels,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::GATEWAY).await;
    health_registry.register(components::METRICS_API).await;

    let metrics = TopologyMetrics::new();
    let logger = StructuredLogger::new(config.cluster_name.clone());

    // Keep serving without a cluster so probes and /api/health can report it
    let aggregator = match KubeGateway::connect().await {
        Ok(gateway) => Some(SnapshotAggregator::new(
            Arc::new(gateway),
            config.to_aggregator_config(),
        )),
        Err(e) => {
            warn!(error = %e, "Running without a cluster connection");
            health_registry
                .set_unhealthy(components::GATEWAY, e.to_string())
                .await;
            None
        }
    };

    let shutdown = CancellationToken::new();
    let app_state = Arc::new(api::AppState::new(
        aggregator,
        health_registry.clone(),
        metrics,
        shutdown.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVER_VERSION, config.api_port);

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    // Aborts in-flight snapshot builds and drains the listener
    shutdown.cancel();
    api_handle.await??;

    info!("Shutdown complete");
    Ok(())
}
