//! Configuration for the clone-detection consumer

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{Error, Result};

/// Main consumer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Clone detector configuration
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl ConsumerConfig {
    /// Load configuration from a TOML file; missing sections use defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config '{}': {}", path.display(), e)))
    }

    /// Apply `URL`, `PORT` and `STATS_FREQ` environment overrides
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("URL") {
            self.server.base_url = url;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Ok(freq) = std::env::var("STATS_FREQ") {
            self.pipeline.report_frequency = freq
                .parse()
                .map_err(|e| Error::Config(format!("Invalid STATS_FREQ '{}': {}", freq, e)))?;
        }
        Ok(self)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.detector.chunk_size == 0 {
            return Err(Error::Config("detector.chunk_size must be at least 1".to_string()));
        }
        if self.pipeline.stage_timeout_secs == Some(0) {
            return Err(Error::Config(
                "pipeline.stage_timeout_secs must be positive when set".to_string(),
            ));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Public URL printed in the periodic report
    pub base_url: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:8080/".to_string(),
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Emit an operational summary every N completed files (0 disables)
    pub report_frequency: usize,
    /// Optional timeout for each analysis stage in seconds
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            report_frequency: 100,
            stage_timeout_secs: None,
        }
    }
}

/// Clone detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Normalized lines per fingerprinted chunk
    pub chunk_size: usize,
    /// Shortest clone, in original lines, worth reporting
    pub min_clone_lines: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            min_clone_lines: 5,
        }
    }
}
