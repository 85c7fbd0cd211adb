//! Per-node drill-down over an existing snapshot

use crate::error::{Result, TopologyError};
use crate::models::{ClusterData, NodeDetail};
use crate::snapshot::PodIndex;

/// Look up `node_name` and attach the full detail of the pods it hosts
///
/// Works purely on `data`, so the detail is consistent with the topology
/// built from the same snapshot.
pub fn resolve_node_detail(data: &ClusterData, node_name: &str) -> Result<NodeDetail> {
    let node = data
        .node(node_name)
        .ok_or_else(|| TopologyError::NotFound(node_name.to_string()))?;

    let index = PodIndex::build(&data.pods);
    let pods_details = index
        .pods_on(node_name)
        .iter()
        .map(|&pod| pod.clone())
        .collect();

    Ok(NodeDetail {
        node: node.clone(),
        pods_details,
    })
}
