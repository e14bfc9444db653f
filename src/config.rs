use std::path::PathBuf;

use tracing::trace;

/// Storage backend configuration
///
/// The `backend` identifier selects the active variant (`file`, `db` or
/// `cloud`); the remaining fields carry the per-variant settings so the
/// backend can be re-selected at runtime without re-reading the file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageConfig {
    /// Backend identifier: `file`, `db` or `cloud`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Path the file backend appends alerts to
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,

    /// Path to the SQLite database file used by the db backend
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL the cloud backend uploads alerts to
    #[serde(default)]
    pub cloud_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: default_backend(),
            file_path: default_file_path(),
            db_path: default_db_path(),
            cloud_url: None,
        }
    }
}

fn default_backend() -> String {
    String::from("file")
}

fn default_file_path() -> PathBuf {
    PathBuf::from("./data/alerts.log")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./alerts.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Metric endpoint URLs, polled once per cycle
    pub endpoints: Vec<String>,

    /// Poll interval in seconds (>= 1)
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Per-fetch timeout in seconds (>= 1)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Alert threshold; values strictly above it trigger notifications
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Storage configuration (optional - defaults to the file backend)
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Check the invariants that cannot be expressed through serde alone.
    ///
    /// Violations are fatal at startup; the configuration is immutable for
    /// the process lifetime, so nothing is re-validated per cycle.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("at least one metric endpoint must be configured");
        }

        if self.interval == 0 {
            anyhow::bail!("poll interval must be at least 1 second");
        }

        if self.timeout == 0 {
            anyhow::bail!("fetch timeout must be at least 1 second");
        }

        Ok(())
    }
}

fn default_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    5
}

fn default_threshold() -> f64 {
    90.0
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))?;
    config.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}
