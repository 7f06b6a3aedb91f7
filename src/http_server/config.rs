//! HTTP Server Configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object (or
//! no file at all) yields a runnable server.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::OrchestratorOptions;
use crate::document::DEFAULT_MAX_DEPTH;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Prefix for the document routes (default: "/rest/data")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Directory for the persistent type registry; in-memory when absent
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Bound on nested document depth (default: 32)
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Cap for query reads and takes without an explicit `max`
    #[serde(default)]
    pub max_results: Option<usize>,

    /// Answer `{}` for a missing id instead of a not-found error (default: true)
    #[serde(default = "default_empty_on_missing_record")]
    pub empty_on_missing_record: bool,

    /// Log filter used when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_path() -> String {
    "/rest/data".to_string()
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_empty_on_missing_record() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            base_path: default_base_path(),
            data_dir: None,
            max_nesting_depth: default_max_nesting_depth(),
            max_results: None,
            empty_on_missing_record: default_empty_on_missing_record(),
            log_filter: default_log_filter(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: HttpServerConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".into()));
        }

        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid("max_nesting_depth must be > 0".into()));
        }

        if !self.base_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "base_path must start with '/': '{}'",
                self.base_path
            )));
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Orchestrator behaviour derived from this config
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            max_nesting_depth: self.max_nesting_depth,
            max_results: self.max_results,
            empty_on_missing_record: self.empty_on_missing_record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_path, "/rest/data");
        assert!(config.cors_origins.is_empty());
        assert!(config.empty_on_missing_record);
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: HttpServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HttpServerConfig::default());
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(9090);
        assert_eq!(config.socket_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_load_and_validate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docspace.json");

        fs::write(&path, r#"{"port": 9000, "max_results": 50}"#).unwrap();
        let config = HttpServerConfig::load(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.orchestrator_options().max_results, Some(50));

        fs::write(&path, r#"{"base_path": "rest"}"#).unwrap();
        assert!(matches!(HttpServerConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, r#"{"max_nesting_depth": 0}"#).unwrap();
        assert!(matches!(HttpServerConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "{").unwrap();
        assert!(matches!(HttpServerConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = HttpServerConfig::load(Path::new("/nonexistent/docspace.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
