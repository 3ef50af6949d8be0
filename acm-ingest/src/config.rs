//! Service configuration for acm-ingest
//!
//! Bootstrap settings come from `acm-ingest.toml` (see
//! [`acm_common::config`] for how the file is located). Every key is
//! optional; absent keys keep the compiled defaults below. Command-line
//! flags are applied on top in `main`.

use crate::error::{Error, Result};
use crate::pipeline::PipelineConfig;
use acm_common::config::{load_toml_config, resolve_config_path, ConfigSource, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ACM_CONFIG";

/// Config file name searched in the platform config directories
pub const CONFIG_FILE_NAME: &str = "acm-ingest.toml";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9090;

/// acm-ingest settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Interface to bind
    pub bind_address: String,
    pub port: u16,
    /// Largest accepted upload body
    pub max_body_bytes: usize,
    pub pipeline: PipelineSection,
    pub events: EventsSection,
    pub logging: LoggingConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: 10 * 1024 * 1024,
            pipeline: PipelineSection::default(),
            events: EventsSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `[pipeline]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub queue_capacity: usize,
    pub worker_count: usize,
    /// Unset: submitters wait for their result indefinitely
    pub result_timeout_ms: Option<u64>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            worker_count: defaults.worker_count,
            result_timeout_ms: None,
        }
    }
}

/// `[events]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    /// Broadcast buffer; slow SSE clients lag beyond this
    pub capacity: usize,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl IngestConfig {
    /// Locate and load the config file, then validate it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let source = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        Self::load_from(source.as_ref())
    }

    pub fn load_from(source: Option<&ConfigSource>) -> Result<Self> {
        let config: IngestConfig = load_toml_config(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline_config().validate()?;

        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(Error::Config(format!(
                "bind_address is not an IP address: {}",
                self.bind_address
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max_body_bytes must be at least 1".to_string()));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Engine settings derived from the `[pipeline]` table
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.pipeline.queue_capacity,
            worker_count: self.pipeline.worker_count,
            result_timeout: self.pipeline.result_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind_address {}: {}", self.bind_address, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
