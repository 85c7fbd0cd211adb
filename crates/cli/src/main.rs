//! Kubeviz CLI
//!
//! A command-line tool for browsing cluster state and topology served by
//! the Kubeviz server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cluster, nodes, workloads};

/// Kubeviz CLI
#[derive(Parser)]
#[command(name = "kubeviz")]
#[command(author, version, about = "CLI for the Kubeviz cluster topology server", long_about = None)]
pub struct Cli {
    /// Server URL (also KUBEVIZ_API_URL, then ~/.config/kubeviz/config.json)
    #[arg(long, env = "KUBEVIZ_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the server can reach the cluster
    Health,

    /// List nodes with role, status and pod count
    Nodes,

    /// Show one node and the pods it hosts
    Node {
        /// Node name
        name: String,
    },

    /// List pods
    Pods {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Filter by node name
        #[arg(long)]
        node: Option<String>,
    },

    /// List namespaces
    Namespaces,

    /// List deployments
    Deployments {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// List services
    Services {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Show the master/worker topology
    Topology,

    /// Re-read the cluster and summarize the fresh snapshot
    Refresh,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    // Initialize client
    let client = client::ApiClient::new(&config.api_url(cli.api_url))?;

    // Execute command
    match cli.command {
        Commands::Health => cluster::health(&client, cli.format).await?,
        Commands::Nodes => nodes::list_nodes(&client, cli.format).await?,
        Commands::Node { name } => nodes::show_node(&client, &name, cli.format).await?,
        Commands::Pods { namespace, node } => {
            workloads::list_pods(&client, config.namespace(namespace), node, cli.format).await?;
        }
        Commands::Namespaces => workloads::list_namespaces(&client, cli.format).await?,
        Commands::Deployments { namespace } => {
            workloads::list_deployments(&client, config.namespace(namespace), cli.format).await?;
        }
        Commands::Services { namespace } => {
            workloads::list_services(&client, config.namespace(namespace), cli.format).await?;
        }
        Commands::Topology => nodes::show_topology(&client, cli.format).await?,
        Commands::Refresh => cluster::refresh(&client, cli.format).await?,
    }

    Ok(())
}
