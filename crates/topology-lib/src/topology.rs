//! Two-tier topology graph for hierarchical rendering
//!
//! The edge rules below are a presentation simplification: masters fan out
//! to every worker, and a master-less cluster is drawn as a chain. Nothing
//! here claims to describe the physical network.

use crate::models::{Node, NodeStatus, Role};
use serde::{Deserialize, Serialize};

/// A node as seen by a renderer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub id: String,
    pub role: Role,
    pub status: NodeStatus,
    pub pods_on_node: usize,
}

impl From<&Node> for Vertex {
    fn from(node: &Node) -> Self {
        Self {
            id: node.name.clone(),
            role: node.role,
            status: node.status,
            pods_on_node: node.pods_on_node,
        }
    }
}

/// Constructed master→worker (or along the worker chain), rendered undirected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

impl TopologyGraph {
    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    /// Vertices adjacent to `id`, in edge order
    pub fn neighbours<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.iter().filter_map(move |e| {
            if e.from == id {
                Some(e.to.as_str())
            } else if e.to == id {
                Some(e.from.as_str())
            } else {
                None
            }
        })
    }
}

/// Derive the graph for a node list
///
/// Deterministic for a given input order: |M|×|W| master→worker edges when
/// both tiers are present, a chain of |W|−1 edges when there are only
/// workers, and no edges otherwise.
pub fn build_graph(nodes: &[Node]) -> TopologyGraph {
    let vertices: Vec<Vertex> = nodes.iter().map(Vertex::from).collect();

    let (masters, workers): (Vec<&Vertex>, Vec<&Vertex>) =
        vertices.iter().partition(|v| v.role == Role::Master);

    let edges = if masters.is_empty() {
        workers
            .windows(2)
            .map(|pair| Edge::new(&pair[0].id, &pair[1].id))
            .collect()
    } else {
        masters
            .iter()
            .flat_map(|m| workers.iter().map(move |w| Edge::new(&m.id, &w.id)))
            .collect()
    };

    TopologyGraph { vertices, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Labels, NodeInfo, ResourceQuantities};
    use std::collections::HashSet;

    fn node(name: &str, role: Role, pods: usize) -> Node {
        Node {
            name: name.to_string(),
            uid: format!("uid-{}", name),
            labels: Labels::new(),
            role,
            status: NodeStatus::Ready,
            capacity: ResourceQuantities::default(),
            allocatable: ResourceQuantities::default(),
            info: NodeInfo::default(),
            addresses: Vec::new(),
            pods_on_node: pods,
            metrics: None,
        }
    }

    fn edge_pairs(graph: &TopologyGraph) -> Vec<(&str, &str)> {
        graph
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect()
    }

    #[test]
    fn test_one_master_two_workers() {
        let nodes = vec![
            node("m1", Role::Master, 3),
            node("w1", Role::Worker, 2),
            node("w2", Role::Worker, 2),
        ];
        let graph = build_graph(&nodes);

        assert_eq!(graph.vertices.len(), 3);
        assert_eq!(edge_pairs(&graph), vec![("m1", "w1"), ("m1", "w2")]);
        assert_eq!(graph.vertex("w1").unwrap().pods_on_node, 2);
    }

    #[test]
    fn test_workers_only_form_a_chain() {
        let nodes = vec![
            node("w1", Role::Worker, 0),
            node("w2", Role::Worker, 0),
            node("w3", Role::Worker, 0),
        ];
        let graph = build_graph(&nodes);

        assert_eq!(edge_pairs(&graph), vec![("w1", "w2"), ("w2", "w3")]);
        let around_w2: Vec<&str> = graph.neighbours("w2").collect();
        assert_eq!(around_w2, vec!["w1", "w3"]);
    }

    #[test]
    fn test_full_bipartite_between_tiers() {
        let nodes = vec![
            node("w1", Role::Worker, 0),
            node("m1", Role::Master, 0),
            node("w2", Role::Worker, 0),
            node("m2", Role::Master, 0),
            node("w3", Role::Worker, 0),
        ];
        let graph = build_graph(&nodes);

        assert_eq!(graph.edges.len(), 2 * 3);
        for edge in &graph.edges {
            assert_eq!(graph.vertex(&edge.from).unwrap().role, Role::Master);
            assert_eq!(graph.vertex(&edge.to).unwrap().role, Role::Worker);
            assert_ne!(edge.from, edge.to);
        }
        let unique: HashSet<&Edge> = graph.edges.iter().collect();
        assert_eq!(unique.len(), graph.edges.len());
    }

    #[test]
    fn test_degenerate_inputs_have_no_edges() {
        assert!(build_graph(&[]).edges.is_empty());
        assert!(build_graph(&[node("w1", Role::Worker, 0)]).edges.is_empty());
        assert!(build_graph(&[node("m1", Role::Master, 0)]).edges.is_empty());

        let masters_only = vec![node("m1", Role::Master, 0), node("m2", Role::Master, 0)];
        let graph = build_graph(&masters_only);
        assert_eq!(graph.vertices.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_edge_count_invariant() {
        for masters in 0..4 {
            for workers in 0..5 {
                let mut nodes = Vec::new();
                for i in 0..masters {
                    nodes.push(node(&format!("m{}", i), Role::Master, 0));
                }
                for i in 0..workers {
                    nodes.push(node(&format!("w{}", i), Role::Worker, 0));
                }

                let expected = match (masters, workers) {
                    (0, w) if w > 1 => w - 1,
                    (m, w) if m > 0 && w > 0 => m * w,
                    _ => 0,
                };
                assert_eq!(
                    build_graph(&nodes).edges.len(),
                    expected,
                    "masters={} workers={}",
                    masters,
                    workers
                );
            }
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let nodes = vec![
            node("m1", Role::Master, 1),
            node("w1", Role::Worker, 4),
            node("w2", Role::Worker, 0),
        ];
        let first = build_graph(&nodes);
        let second = build_graph(&nodes);

        let as_sets = |g: &TopologyGraph| {
            (
                g.vertices.iter().cloned().collect::<HashSet<_>>(),
                g.edges.iter().cloned().collect::<HashSet<_>>(),
            )
        };
        assert_eq!(as_sets(&first), as_sets(&second));
        assert_eq!(first, second);
    }
}
