//! Cluster state aggregation and topology construction
//!
//! This crate provides the core functionality for:
//! - Typed access to the cluster API through a gateway trait
//! - Concurrent snapshot aggregation with partial-failure handling
//! - Node role classification, pod indexing and metrics merging
//! - Topology graph derivation and per-node detail resolution
//! - Health checks and observability

pub mod detail;
pub mod error;
pub mod gateway;
pub mod health;
pub mod models;
pub mod observability;
pub mod snapshot;
pub mod topology;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use detail::resolve_node_detail;
pub use error::TopologyError;
pub use gateway::{ClusterGateway, KubeGateway};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{StructuredLogger, TopologyMetrics};
pub use snapshot::{AggregatorConfig, RoleClassifier, SnapshotAggregator};
pub use topology::{build_graph, Edge, TopologyGraph, Vertex};
