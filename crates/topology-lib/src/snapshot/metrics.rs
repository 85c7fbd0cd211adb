//! Attaching live usage to node records

use crate::gateway::NodeMetrics;
use crate::models::{Node, NodeUsage};
use kube::ResourceExt;
use std::collections::HashMap;

/// Index metrics-server samples by node name
pub fn usage_by_node(samples: Vec<NodeMetrics>) -> HashMap<String, NodeUsage> {
    samples
        .into_iter()
        .map(|sample| {
            let usage = NodeUsage {
                cpu: sample.usage.cpu.0.clone(),
                memory: sample.usage.memory.0.clone(),
            };
            (sample.name_any(), usage)
        })
        .collect()
}

/// Attach usage to every node that has a sample; other nodes keep `metrics` unset
pub fn merge_metrics(nodes: Vec<Node>, usage: &HashMap<String, NodeUsage>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| {
            let metrics = usage.get(&node.name).cloned();
            Node { metrics, ..node }
        })
        .collect()
}
