//! Node and topology commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use topology_lib::{Node, Role, TopologyGraph, Vertex};

use crate::client::ApiClient;
use crate::commands::workloads::PodRow;
use crate::output::{
    color_node_status, color_role, print_json, print_table, print_warning, OutputFormat,
};

/// Row for the node list table
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Pods")]
    pods: usize,
    #[tabled(rename = "CPU (alloc)")]
    cpu: String,
    #[tabled(rename = "Memory (alloc)")]
    memory: String,
    #[tabled(rename = "Usage")]
    usage: String,
    #[tabled(rename = "Kubelet")]
    kubelet: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            role: color_role(node.role),
            status: color_node_status(node.status),
            pods: node.pods_on_node,
            cpu: node.allocatable.cpu.clone(),
            memory: node.allocatable.memory.clone(),
            usage: node
                .metrics
                .as_ref()
                .map(|m| format!("{} / {}", m.cpu, m.memory))
                .unwrap_or_else(|| "N/A".dimmed().to_string()),
            kubelet: node.info.kubelet_version.clone(),
        }
    }
}

/// List nodes
pub async fn list_nodes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let nodes = client.nodes().await?;

    match format {
        OutputFormat::Json => print_json(&nodes)?,
        OutputFormat::Table => {
            let rows: Vec<NodeRow> = nodes.iter().map(NodeRow::from).collect();
            print_table(&rows, "No nodes found");
        }
    }

    Ok(())
}

/// Show one node with the pods it hosts
pub async fn show_node(client: &ApiClient, name: &str, format: OutputFormat) -> Result<()> {
    let detail = client.node(name).await?;

    match format {
        OutputFormat::Json => print_json(&detail)?,
        OutputFormat::Table => {
            let node = &detail.node;
            println!("{} {}", "Node".bold(), node.name.cyan().bold());
            println!("{}", "=".repeat(50));
            println!("Role:                   {}", color_role(node.role));
            println!("Status:                 {}", color_node_status(node.status));
            println!(
                "OS / Arch:              {} / {}",
                node.info.os, node.info.architecture
            );
            println!("Kernel:                 {}", node.info.kernel);
            println!("Container runtime:      {}", node.info.container_runtime);
            println!("Kubelet:                {}", node.info.kubelet_version);
            for address in &node.addresses {
                println!(
                    "{:<24}{}",
                    format!("{}:", address.address_type),
                    address.address
                );
            }
            println!();

            println!("{}", "Resources".bold());
            println!("{}", "-".repeat(50));
            println!(
                "Capacity:               cpu={} memory={} pods={}",
                node.capacity.cpu, node.capacity.memory, node.capacity.pods
            );
            println!(
                "Allocatable:            cpu={} memory={} pods={}",
                node.allocatable.cpu, node.allocatable.memory, node.allocatable.pods
            );
            match &node.metrics {
                Some(usage) => println!(
                    "Usage:                  cpu={} memory={}",
                    usage.cpu, usage.memory
                ),
                None => println!("Usage:                  {}", "N/A".dimmed()),
            }
            println!();

            println!("{} ({})", "Pods".bold(), detail.pods_details.len());
            let rows: Vec<PodRow> = detail.pods_details.iter().map(PodRow::from).collect();
            print_table(&rows, "No pods scheduled on this node");
        }
    }

    Ok(())
}

/// Show the cluster topology as a tree
pub async fn show_topology(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let graph = client.topology().await?;

    match format {
        OutputFormat::Json => print_json(&graph)?,
        OutputFormat::Table => {
            let lines = render_topology(&graph);
            if lines.is_empty() {
                print_warning("No nodes found");
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn describe(vertex: &Vertex) -> String {
    format!(
        "{} [{}] ({}, {} pods)",
        vertex.id, vertex.role, vertex.status, vertex.pods_on_node
    )
}

/// Plain-text rendering: each master with its workers beneath, or the
/// worker chain on one line when there is no master
pub fn render_topology(graph: &TopologyGraph) -> Vec<String> {
    let masters: Vec<&Vertex> = graph
        .vertices
        .iter()
        .filter(|v| v.role == Role::Master)
        .collect();

    if masters.is_empty() {
        if graph.vertices.is_empty() {
            return Vec::new();
        }
        let chain: Vec<String> = graph.vertices.iter().map(describe).collect();
        return vec![chain.join(" ── ")];
    }

    let mut lines = Vec::new();
    for master in masters {
        lines.push(describe(master));
        let workers: Vec<&Vertex> = graph
            .neighbours(&master.id)
            .filter_map(|id| graph.vertex(id))
            .collect();
        for (i, worker) in workers.iter().enumerate() {
            let branch = if i + 1 == workers.len() { "└──" } else { "├──" };
            lines.push(format!("{} {}", branch, describe(worker)));
        }
    }
    lines
}
