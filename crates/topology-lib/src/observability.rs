//! Observability infrastructure for snapshot aggregation
//!
//! Provides:
//! - Prometheus metrics (build latency, snapshot outcomes, partial failures, cluster size)
//! - Structured JSON logging with tracing

use crate::models::{ResourceKind, Snapshot};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for snapshot build latency (in seconds)
const BUILD_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<TopologyMetricsInner> = OnceLock::new();

struct TopologyMetricsInner {
    build_latency_seconds: Histogram,
    snapshots_built: IntCounter,
    snapshot_failures: IntCounter,
    partial_failures: IntCounterVec,
    cluster_nodes: IntGauge,
    cluster_pods: IntGauge,
    metrics_api_available: IntGauge,
}

impl TopologyMetricsInner {
    fn new() -> Self {
        Self {
            build_latency_seconds: register_histogram!(
                "kubeviz_snapshot_build_latency_seconds",
                "Time spent fetching and assembling a cluster snapshot",
                BUILD_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register snapshot_build_latency_seconds"),

            snapshots_built: register_int_counter!(
                "kubeviz_snapshots_built_total",
                "Total number of cluster snapshots built"
            )
            .expect("Failed to register snapshots_built_total"),

            snapshot_failures: register_int_counter!(
                "kubeviz_snapshot_failures_total",
                "Total number of snapshot builds that failed entirely"
            )
            .expect("Failed to register snapshot_failures_total"),

            partial_failures: register_int_counter_vec!(
                "kubeviz_partial_fetch_failures_total",
                "Resource fetches that failed while a snapshot was still built",
                &["kind"]
            )
            .expect("Failed to register partial_fetch_failures_total"),

            cluster_nodes: register_int_gauge!(
                "kubeviz_cluster_nodes",
                "Number of nodes in the latest snapshot"
            )
            .expect("Failed to register cluster_nodes"),

            cluster_pods: register_int_gauge!(
                "kubeviz_cluster_pods",
                "Number of pods in the latest snapshot"
            )
            .expect("Failed to register cluster_pods"),

            metrics_api_available: register_int_gauge!(
                "kubeviz_metrics_api_available",
                "1 if node metrics were available for the latest snapshot"
            )
            .expect("Failed to register metrics_api_available"),
        }
    }
}

/// Prometheus handle for topology metrics
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying collectors.
#[derive(Clone)]
pub struct TopologyMetrics {
    _private: (),
}

impl Default for TopologyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(TopologyMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &TopologyMetricsInner {
        GLOBAL_METRICS.get_or_init(TopologyMetricsInner::new)
    }

    pub fn observe_build_latency(&self, duration_secs: f64) {
        self.inner().build_latency_seconds.observe(duration_secs);
    }

    /// Record the outcome of a successful build
    pub fn record_snapshot(&self, snapshot: &Snapshot) {
        let inner = self.inner();
        inner.snapshots_built.inc();
        inner.cluster_nodes.set(snapshot.data.nodes.len() as i64);
        inner.cluster_pods.set(snapshot.data.pods.len() as i64);
        inner
            .metrics_api_available
            .set(i64::from(snapshot.metrics_available));
        for failure in &snapshot.failures {
            self.inc_partial_failure(failure.kind);
        }
    }

    pub fn inc_partial_failure(&self, kind: ResourceKind) {
        self.inner()
            .partial_failures
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn inc_snapshot_failures(&self) {
        self.inner().snapshot_failures.inc();
    }
}

/// Structured logger for aggregation events
///
/// Provides consistent JSON-formatted events tagged with the cluster they
/// describe.
#[derive(Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn log_snapshot_built(&self, snapshot: &Snapshot, elapsed_ms: u128) {
        if snapshot.is_degraded() {
            warn!(
                event = "snapshot_built",
                cluster = %self.cluster,
                nodes = snapshot.data.nodes.len(),
                pods = snapshot.data.pods.len(),
                failed_kinds = snapshot.failures.len(),
                metrics_available = snapshot.metrics_available,
                elapsed_ms = elapsed_ms as u64,
                "Built degraded cluster snapshot"
            );
        } else {
            info!(
                event = "snapshot_built",
                cluster = %self.cluster,
                nodes = snapshot.data.nodes.len(),
                pods = snapshot.data.pods.len(),
                metrics_available = snapshot.metrics_available,
                elapsed_ms = elapsed_ms as u64,
                "Built cluster snapshot"
            );
        }
    }

    pub fn log_partial_failure(&self, kind: ResourceKind, cause: &str) {
        warn!(
            event = "partial_fetch_failure",
            cluster = %self.cluster,
            kind = %kind,
            cause = %cause,
            "Resource fetch failed, continuing with an empty collection"
        );
    }

    /// Missing metrics-server is common, so this stays at debug level
    pub fn log_metrics_unavailable(&self, cause: &str) {
        debug!(
            event = "metrics_unavailable",
            cluster = %self.cluster,
            cause = %cause,
            "Node metrics unavailable, nodes will carry no usage"
        );
    }

    pub fn log_aggregation_failed(&self, causes: usize) {
        warn!(
            event = "aggregation_failed",
            cluster = %self.cluster,
            failed_kinds = causes,
            "Every resource fetch failed"
        );
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "server_started",
            cluster = %self.cluster,
            version = %version,
            port = port,
            "Kubeviz server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            cluster = %self.cluster,
            reason = %reason,
            "Kubeviz server shutting down"
        );
    }
}
