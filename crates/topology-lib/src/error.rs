//! Error taxonomy for snapshot aggregation and lookups

use crate::models::PartialFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    /// The cluster API cannot be reached at all
    #[error("Cluster API unavailable: {0}")]
    GatewayUnavailable(String),

    /// Every resource fetch of a snapshot failed
    #[error("Aggregation failed: all {} resource fetches failed", causes.len())]
    AggregationFailed { causes: Vec<PartialFailure> },

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Snapshot build cancelled")]
    Cancelled,
}

impl TopologyError {
    /// Human-readable causes, one per failed resource kind
    pub fn details(&self) -> Option<String> {
        match self {
            TopologyError::AggregationFailed { causes } => Some(
                causes
                    .iter()
                    .map(|f| format!("{}: {}", f.kind, f.cause))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;
