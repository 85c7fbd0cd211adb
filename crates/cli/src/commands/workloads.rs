//! Pod, namespace, deployment and service listings

use anyhow::Result;
use chrono::Utc;
use tabled::Tabled;
use topology_lib::{Deployment, Namespace, Pod, Service, ServicePort};

use crate::client::ApiClient;
use crate::output::{
    color_replicas, color_status, format_age, or_dash, print_json, print_table, OutputFormat,
};

/// Row for pod tables
#[derive(Tabled)]
pub struct PodRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Node")]
    node: String,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        let ready = pod.containers.iter().filter(|c| c.ready).count();
        Self {
            namespace: pod.namespace.clone(),
            name: pod.name.clone(),
            ready: format!("{}/{}", ready, pod.containers.len()),
            status: color_status(&pod.status),
            restarts: pod.restart_count,
            ip: or_dash(pod.ip.as_deref()),
            node: or_dash(pod.node_name()),
        }
    }
}

#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Age")]
    age: String,
}

impl From<&Namespace> for NamespaceRow {
    fn from(ns: &Namespace) -> Self {
        Self {
            name: ns.name.clone(),
            status: color_status(&ns.status),
            age: format_age(ns.creation_timestamp.as_deref(), Utc::now()),
        }
    }
}

#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Available")]
    available: i32,
}

impl From<&Deployment> for DeploymentRow {
    fn from(d: &Deployment) -> Self {
        Self {
            namespace: d.namespace.clone(),
            name: d.name.clone(),
            ready: color_replicas(d.ready_replicas, d.replicas),
            available: d.available_replicas,
        }
    }
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    service_type: String,
    #[tabled(rename = "Cluster IP")]
    cluster_ip: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

impl From<&Service> for ServiceRow {
    fn from(s: &Service) -> Self {
        Self {
            namespace: s.namespace.clone(),
            name: s.name.clone(),
            service_type: s.service_type.clone(),
            cluster_ip: or_dash(s.cluster_ip.as_deref()),
            ports: format_ports(&s.ports),
        }
    }
}

/// kubectl-style port list, e.g. `80:8080/TCP,443/TCP`
fn format_ports(ports: &[ServicePort]) -> String {
    if ports.is_empty() {
        return "<none>".to_string();
    }
    ports
        .iter()
        .map(|p| {
            if p.target_port.is_empty() || p.target_port == p.port.to_string() {
                format!("{}/{}", p.port, p.protocol)
            } else {
                format!("{}:{}/{}", p.port, p.target_port, p.protocol)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// List pods, optionally narrowed to a namespace or node
pub async fn list_pods(
    client: &ApiClient,
    namespace: Option<String>,
    node: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let pods = client.pods(namespace.as_deref(), node.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&pods)?,
        OutputFormat::Table => {
            let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();
            print_table(&rows, "No pods found");
        }
    }

    Ok(())
}

pub async fn list_namespaces(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let namespaces = client.namespaces().await?;

    match format {
        OutputFormat::Json => print_json(&namespaces)?,
        OutputFormat::Table => {
            let rows: Vec<NamespaceRow> = namespaces.iter().map(NamespaceRow::from).collect();
            print_table(&rows, "No namespaces found");
        }
    }

    Ok(())
}

pub async fn list_deployments(
    client: &ApiClient,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let deployments = client.deployments(namespace.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&deployments)?,
        OutputFormat::Table => {
            let rows: Vec<DeploymentRow> = deployments.iter().map(DeploymentRow::from).collect();
            print_table(&rows, "No deployments found");
        }
    }

    Ok(())
}

pub async fn list_services(
    client: &ApiClient,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let services = client.services(namespace.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&services)?,
        OutputFormat::Table => {
            let rows: Vec<ServiceRow> = services.iter().map(ServiceRow::from).collect();
            print_table(&rows, "No services found");
        }
    }

    Ok(())
}
