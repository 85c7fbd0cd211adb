//! Pod grouping by owning node and per-pod container status

use crate::models::Pod;
use k8s_openapi::api::core::v1::PodStatus;
use std::collections::HashMap;

/// Pods grouped by the node they are scheduled on
///
/// Unscheduled pods appear in neither map. For every node present,
/// `count_by_node[n] == pods_by_node[n].len()`.
#[derive(Debug, Default)]
pub struct PodIndex<'a> {
    pods_by_node: HashMap<&'a str, Vec<&'a Pod>>,
    count_by_node: HashMap<&'a str, usize>,
}

impl<'a> PodIndex<'a> {
    pub fn build(pods: &'a [Pod]) -> Self {
        let mut index = Self::default();

        for pod in pods {
            let Some(node) = pod.node_name() else {
                continue;
            };
            index.pods_by_node.entry(node).or_default().push(pod);
            *index.count_by_node.entry(node).or_insert(0) += 1;
        }

        index
    }

    /// Pods hosted by `node`, in the order they were listed
    pub fn pods_on(&self, node: &str) -> &[&'a Pod] {
        self.pods_by_node
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, node: &str) -> usize {
        self.count_by_node.get(node).copied().unwrap_or(0)
    }

    pub fn pods_by_node(&self) -> &HashMap<&'a str, Vec<&'a Pod>> {
        &self.pods_by_node
    }

    pub fn count_by_node(&self) -> &HashMap<&'a str, usize> {
        &self.count_by_node
    }
}

/// Sum of container restart counts; negative counters are treated as zero
pub fn restart_count(status: Option<&PodStatus>) -> u32 {
    status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|cs| u32::try_from(cs.restart_count).unwrap_or(0))
                .sum()
        })
        .unwrap_or(0)
}

/// Readiness of the named container, `false` when it has no status yet
pub fn container_ready(status: Option<&PodStatus>, container: &str) -> bool {
    status
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.iter().find(|cs| cs.name == container))
        .map(|cs| cs.ready)
        .unwrap_or(false)
}
