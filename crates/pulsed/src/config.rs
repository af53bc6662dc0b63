//! pulseboard.toml configuration.
//!
//! Every field is optional in the file. Command-line flags override file
//! values, which override the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardSection {
    pub api_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub data_dir: PathBuf,
    pub api_url: String,
    pub poll_interval: Duration,
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: Overrides) -> anyhow::Result<Self> {
        let port = cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT);
        let data_dir = cli
            .data_dir
            .or(file.server.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let api_url = cli
            .api_url
            .or(file.dashboard.api_url)
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"));
        let poll_ms = cli
            .poll_interval_ms
            .or(file.dashboard.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        anyhow::ensure!(poll_ms > 0, "poll interval must be greater than zero");

        Ok(Self {
            port,
            data_dir,
            api_url,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}
