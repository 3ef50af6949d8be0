//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. Which file is used follows this
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`~/.config/acm/<file>` on Linux)
//! 4. System config directory (`/etc/acm/<file>`, unix only)
//!
//! A file found through 3 or 4 is optional: when none exists the caller gets
//! compiled defaults. A file named explicitly through 1 or 2 must exist.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config directories
pub const CONFIG_DIR_NAME: &str = "acm";

/// Logging configuration shared by all ACM services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a configuration file path came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` on the command line
    CommandLine(PathBuf),
    /// Environment variable
    Environment(PathBuf),
    /// Platform config directory (file may be absent)
    Discovered(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::Discovered(p) => p,
        }
    }

    /// Explicitly named files must exist; discovered ones are optional
    pub fn is_explicit(&self) -> bool {
        !matches!(self, ConfigSource::Discovered(_))
    }
}

/// Resolve which TOML file to read for a service
///
/// Returns `None` when neither an explicit path nor any discovered file exists.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<ConfigSource> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(ConfigSource::CommandLine(path.to_path_buf()));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(ConfigSource::Environment(PathBuf::from(path)));
        }
    }

    // Priority 3/4: platform config directories
    candidate_paths(file_name)
        .into_iter()
        .find(|p| p.exists())
        .map(ConfigSource::Discovered)
}

/// Platform-dependent locations searched for `file_name`
fn candidate_paths(file_name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR_NAME).join(file_name));
    }

    if cfg!(unix) {
        paths.push(PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(file_name));
    }

    paths
}

/// Load a TOML config, falling back to `T::default()` when no file applies
pub fn load_toml_config<T>(source: Option<&ConfigSource>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(source) = source else {
        warn!("No configuration file found, using compiled defaults");
        return Ok(T::default());
    };

    let path = source.path();
    if !path.exists() {
        if source.is_explicit() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!("Config file {} disappeared, using compiled defaults", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse TOML text into a config struct
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_logging_defaults_to_info() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let sample: Sample = parse_toml_config("name = \"x\"").unwrap();
        assert_eq!(sample.name, "x");
        assert_eq!(sample.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_toml_is_config_error() {
        let result: Result<Sample> = parse_toml_config("name = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let source = resolve_config_path(Some(Path::new("/tmp/x.toml")), "ACM_UNUSED_VAR", "x.toml");
        assert_eq!(
            source,
            Some(ConfigSource::CommandLine(PathBuf::from("/tmp/x.toml")))
        );
    }

    #[test]
    fn test_no_source_yields_defaults() {
        let sample: Sample = load_toml_config(None).unwrap();
        assert_eq!(sample, Sample::default());
    }
}
