//! Engine configuration, loaded from a TOML file with environment
//! overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding `checks.json` and `results/`.
    pub data_dir: PathBuf,
    /// Wall-clock bound for a single probe execution.
    pub probe_timeout_seconds: u64,
    /// Cadence of the scheduler's reconciliation pass.
    pub reconcile_interval_seconds: u64,
    /// Sliding result history window.
    pub retention_days: i64,
    /// Optional JSON array of checks to seed on first start.
    pub seed_file: Option<PathBuf>,
    /// Optional alert sink; alerts are broadcast-only when unset.
    pub alert_webhook_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            probe_timeout_seconds: 5,
            reconcile_interval_seconds: 60,
            retention_days: 7,
            seed_file: None,
            alert_webhook_url: None,
        }
    }
}

impl EngineConfig {
    /// Loads the config file, falling back to defaults when it does not
    /// exist. `NODEWATCH_DATA_DIR` overrides the data directory either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            info!(path = %path.display(), "Config file not found, using defaults.");
            Self::default()
        };

        if let Ok(dir) = std::env::var("NODEWATCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}
