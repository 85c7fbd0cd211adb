//! Cluster-wide commands: connectivity and manual refresh

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{
    color_status, print_error, print_info, print_json, print_success, print_warning, OutputFormat,
};

/// Check server-to-cluster connectivity; fails when the cluster is unreachable
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            if health.status == "healthy" {
                print_success(&health.message);
            } else {
                print_error(&health.message);
            }
            println!("Status: {}", color_status(&health.status));
        }
    }

    if health.status != "healthy" {
        anyhow::bail!("cluster is {}", health.status);
    }
    Ok(())
}

/// Rebuild the snapshot and topology in one cycle and summarize the result
pub async fn refresh(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.refresh().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let snapshot = &result.snapshot;
            let data = &snapshot.data;

            println!("{}", "Cluster Snapshot".bold());
            println!("{}", "=".repeat(50));
            println!("Taken at:               {}", snapshot.taken_at.to_rfc3339());
            println!("Nodes:                  {}", data.nodes.len());
            println!("Pods:                   {}", data.pods.len());
            println!("Namespaces:             {}", data.namespaces.len());
            println!("Deployments:            {}", data.deployments.len());
            println!("Services:               {}", data.services.len());
            println!("Topology edges:         {}", result.topology.edges.len());
            println!();

            if snapshot.metrics_available {
                print_info("Node metrics available");
            } else {
                print_info("Node metrics unavailable (is metrics-server installed?)");
            }
            for failure in &snapshot.failures {
                print_warning(&format!("{} not fetched: {}", failure.kind, failure.cause));
            }
            if !snapshot.is_degraded() {
                print_success("Snapshot complete");
            }
        }
    }

    Ok(())
}
