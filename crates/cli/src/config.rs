//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server address used when neither flag, environment nor config file set one
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Namespace applied to namespaced listings when none is given
    pub default_namespace: Option<String>,
}

impl Config {
    /// Load configuration from `~/.config/kubeviz/config.json`
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to `path`, creating parent directories
    #[allow(dead_code)]
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Pick the server address: explicit flag or env, then this file, then the default
    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Namespace filter, falling back to the configured default
    pub fn namespace(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.default_namespace.clone())
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("kubeviz").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kubeviz").join("config.json");

        let config = Config {
            api_url: Some("http://kubeviz.internal:5001".to_string()),
            default_namespace: Some("shop".to_string()),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_api_url_precedence() {
        let empty = Config::default();
        assert_eq!(empty.api_url(None), DEFAULT_API_URL);

        let configured = Config {
            api_url: Some("http://from-file:5001".to_string()),
            ..Default::default()
        };
        assert_eq!(configured.api_url(None), "http://from-file:5001");
        assert_eq!(
            configured.api_url(Some("http://from-flag:5001".to_string())),
            "http://from-flag:5001"
        );
    }

    #[test]
    fn test_namespace_fallback() {
        let config = Config {
            default_namespace: Some("shop".to_string()),
            ..Default::default()
        };
        assert_eq!(config.namespace(None).as_deref(), Some("shop"));
        assert_eq!(config.namespace(Some("jobs".to_string())).as_deref(), Some("jobs"));
    }
}
