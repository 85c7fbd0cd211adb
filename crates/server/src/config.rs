//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use topology_lib::{AggregatorConfig, RoleClassifier};

/// Server configuration, read from `KUBEVIZ_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP API, probes and metrics
    pub api_port: u16,

    /// Name attached to log events
    pub cluster_name: String,

    /// Upper bound for each resource list call in seconds
    pub fetch_timeout_secs: u64,

    /// Label keys that mark a node as control plane
    pub control_plane_labels: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: 5001,
            cluster_name: "default".to_string(),
            fetch_timeout_secs: 10,
            control_plane_labels: RoleClassifier::default().markers().to_vec(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment on top of the defaults
    pub fn load() -> Result<Self> {
        Self::from_source(
            config::Environment::with_prefix("KUBEVIZ")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("control_plane_labels"),
        )
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let config = config::Config::builder()
            .set_default("api_port", i64::from(defaults.api_port))?
            .set_default("cluster_name", defaults.cluster_name)?
            .set_default("fetch_timeout_secs", defaults.fetch_timeout_secs)?
            .set_default("control_plane_labels", defaults.control_plane_labels)?
            .add_source(source)
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid KUBEVIZ_* configuration")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn to_aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            cluster_name: self.cluster_name.clone(),
            fetch_timeout: self.fetch_timeout(),
            classifier: RoleClassifier::new(self.control_plane_labels.iter().map(String::as_str)),
        }
    }
}
