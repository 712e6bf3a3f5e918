use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::time::Duration;

use crate::dashboards::d100_sales_overview::aggregation::DEFAULT_TOP_N;

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub map: MapConfig,
    pub dashboard: DashboardConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatasetConfig {
    /// http(s) URL or local file path of the transactions CSV
    pub url: String,
    pub timeout_secs: u64,
    /// Parse warnings kept on the dataset; the rest are only counted
    pub max_warning_samples: usize,
}

impl DatasetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: "https://huggingface.co/datasets/port-rico/badp-project/resolve/main/main_data.csv"
                .to_string(),
            timeout_secs: 120,
            max_warning_samples: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub geojson_url: String,
    pub key_property: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub legend: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            geojson_url: "https://raw.githubusercontent.com/codeforamerica/click_that_hood/main/public/data/brazil-states.geojson".to_string(),
            key_property: "sigla".to_string(),
            center_lat: -14.235,
            center_lon: -51.925,
            zoom: 4,
            legend: "Average delivery time (days)".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[dataset]
url = "https://huggingface.co/datasets/port-rico/badp-project/resolve/main/main_data.csv"
timeout_secs = 120
max_warning_samples = 100

[map]
geojson_url = "https://raw.githubusercontent.com/codeforamerica/click_that_hood/main/public/data/brazil-states.geojson"
key_property = "sigla"
center_lat = -14.235
center_lon = -51.925
zoom = 4
legend = "Average delivery time (days)"

[dashboard]
top_n = 10

[server]
host = "0.0.0.0"
port = 3000
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

/// Make `config` the process-wide configuration. Can only be done once.
pub fn install(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("configuration is already installed"))
}

/// Process-wide configuration, or the defaults when none was installed
pub fn current() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Parse and check a TOML configuration document
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.dataset.url.trim().is_empty() {
        anyhow::bail!("[dataset] url must not be empty");
    }
    if config.dashboard.top_n == 0 {
        anyhow::bail!("[dashboard] top_n must be at least 1");
    }
    Ok(config)
}
