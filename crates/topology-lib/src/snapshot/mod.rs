//! Cluster snapshot aggregation
//!
//! Fans out one list call per resource kind against the gateway, waits for
//! all of them behind a single join, then normalizes and joins the results
//! on node name. Snapshots are request-scoped: nothing is cached between
//! builds, so a refresh always reflects the cluster as it is now.

mod metrics;
mod normalize;
mod pods;
mod roles;


pub use metrics::{merge_metrics, usage_by_node};
pub use normalize::{
    normalize_deployment, normalize_namespace, normalize_node, normalize_pod, normalize_service,
};
pub use pods::{container_ready, restart_count, PodIndex};
pub use roles::{RoleClassifier, CONTROL_PLANE_LABEL, LEGACY_MASTER_LABEL};

use crate::error::{Result, TopologyError};
use crate::gateway::{ClusterGateway, NodeMetrics};
use crate::models::{ClusterData, Node, PartialFailure, Pod, ResourceKind, Snapshot};
use crate::observability::{StructuredLogger, TopologyMetrics};
use chrono::Utc;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Number of resource kinds whose failure counts towards total failure
const CORE_KINDS: usize = 5;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Name used to tag log events
    pub cluster_name: String,
    /// Upper bound for each individual list call
    pub fetch_timeout: Duration,
    pub classifier: RoleClassifier,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cluster_name: "default".to_string(),
            fetch_timeout: Duration::from_secs(10),
            classifier: RoleClassifier::default(),
        }
    }
}

type FetchResult<T> = std::result::Result<Vec<T>, String>;

/// Raw results of one fan-out, one slot per resource kind
struct Fetched {
    nodes: FetchResult<core::Node>,
    pods: FetchResult<core::Pod>,
    namespaces: FetchResult<core::Namespace>,
    deployments: FetchResult<apps::Deployment>,
    services: FetchResult<core::Service>,
    metrics: FetchResult<NodeMetrics>,
}

/// Builds [`Snapshot`]s from a shared gateway handle
#[derive(Clone)]
pub struct SnapshotAggregator {
    gateway: Arc<dyn ClusterGateway>,
    config: AggregatorConfig,
    metrics: TopologyMetrics,
    logger: StructuredLogger,
}

impl SnapshotAggregator {
    pub fn new(gateway: Arc<dyn ClusterGateway>, config: AggregatorConfig) -> Self {
        let logger = StructuredLogger::new(config.cluster_name.clone());
        Self {
            gateway,
            config,
            metrics: TopologyMetrics::new(),
            logger,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Fetch every resource kind and assemble a snapshot
    ///
    /// Fails only when all five resource fetches fail, or when `cancel`
    /// fires first. In-flight fetches are dropped on cancellation and no
    /// partial snapshot is returned.
    pub async fn build_snapshot(&self, cancel: &CancellationToken) -> Result<Snapshot> {
        let start = Instant::now();

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Snapshot build cancelled");
                return Err(TopologyError::Cancelled);
            }
            fetched = self.fetch_all() => fetched,
        };

        let outcome = self.assemble(fetched);
        let elapsed = start.elapsed();
        self.metrics.observe_build_latency(elapsed.as_secs_f64());

        match &outcome {
            Ok(snapshot) => {
                self.metrics.record_snapshot(snapshot);
                self.logger.log_snapshot_built(snapshot, elapsed.as_millis());
            }
            Err(TopologyError::AggregationFailed { causes }) => {
                self.metrics.inc_snapshot_failures();
                self.logger.log_aggregation_failed(causes.len());
            }
            Err(_) => self.metrics.inc_snapshot_failures(),
        }

        outcome
    }

    async fn fetch_all(&self) -> Fetched {
        let gateway = self.gateway.as_ref();

        let (nodes, pods, namespaces, deployments, services, metrics) = tokio::join!(
            self.fetch(ResourceKind::Nodes, gateway.list_nodes()),
            self.fetch(ResourceKind::Pods, gateway.list_pods()),
            self.fetch(ResourceKind::Namespaces, gateway.list_namespaces()),
            self.fetch(ResourceKind::Deployments, gateway.list_deployments()),
            self.fetch(ResourceKind::Services, gateway.list_services()),
            self.fetch(ResourceKind::NodeMetrics, gateway.node_metrics()),
        );

        Fetched {
            nodes,
            pods,
            namespaces,
            deployments,
            services,
            metrics,
        }
    }

    async fn fetch<T, F>(&self, kind: ResourceKind, call: F) -> FetchResult<T>
    where
        F: Future<Output = anyhow::Result<Vec<T>>>,
    {
        match tokio::time::timeout(self.config.fetch_timeout, call).await {
            Ok(Ok(items)) => {
                debug!(kind = %kind, count = items.len(), "Fetched resources");
                Ok(items)
            }
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(_) => Err(format!("timed out after {:?}", self.config.fetch_timeout)),
        }
    }

    fn assemble(&self, fetched: Fetched) -> Result<Snapshot> {
        let mut failures = Vec::new();
        let raw_nodes = self.settle(ResourceKind::Nodes, fetched.nodes, &mut failures);
        let raw_pods = self.settle(ResourceKind::Pods, fetched.pods, &mut failures);
        let raw_namespaces =
            self.settle(ResourceKind::Namespaces, fetched.namespaces, &mut failures);
        let raw_deployments =
            self.settle(ResourceKind::Deployments, fetched.deployments, &mut failures);
        let raw_services = self.settle(ResourceKind::Services, fetched.services, &mut failures);

        if failures.len() == CORE_KINDS {
            return Err(TopologyError::AggregationFailed { causes: failures });
        }

        let pods: Vec<Pod> = raw_pods.iter().map(normalize_pod).collect();
        let nodes: Vec<Node> = {
            let index = PodIndex::build(&pods);
            raw_nodes
                .iter()
                .map(|n| normalize_node(n, &self.config.classifier, &index))
                .collect()
        };

        let (nodes, metrics_available) = match fetched.metrics {
            Ok(samples) => (merge_metrics(nodes, &usage_by_node(samples)), true),
            Err(cause) => {
                self.logger.log_metrics_unavailable(&cause);
                (nodes, false)
            }
        };

        let data = ClusterData {
            nodes,
            namespaces: raw_namespaces.iter().map(normalize_namespace).collect(),
            deployments: raw_deployments.iter().map(normalize_deployment).collect(),
            services: raw_services.iter().map(normalize_service).collect(),
            pods,
        };

        Ok(Snapshot {
            data,
            failures,
            metrics_available,
            taken_at: Utc::now(),
        })
    }

    /// Unwrap one fetch slot, recording a partial failure for an empty collection
    fn settle<T>(
        &self,
        kind: ResourceKind,
        result: FetchResult<T>,
        failures: &mut Vec<PartialFailure>,
    ) -> Vec<T> {
        result.unwrap_or_else(|cause| {
            self.logger.log_partial_failure(kind, &cause);
            failures.push(PartialFailure { kind, cause });
            Vec::new()
        })
    }
}
