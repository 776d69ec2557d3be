use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub explain: ExplainConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS for the dashboard frontend
    #[serde(default = "default_true")]
    pub cors: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding per-domain model artifacts
    /// (supplier_model.json, shipment_model.json, inventory_model.json)
    #[serde(default = "default_models_dir")]
    pub dir: String,
    #[serde(default = "default_true")]
    pub hot_reload: bool,
    #[serde(default = "default_reload_interval")]
    pub check_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Serve mock predictions for domains without a loaded artifact.
    /// When false, such domains answer 503.
    #[serde(default = "default_true")]
    pub allow_placeholder: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplainConfig {
    /// Number of shapValues entries returned per prediction
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// |fraction| at or above this is labeled "high"
    #[serde(default = "default_high_impact")]
    pub high_impact: f64,
    /// |fraction| at or above this (but below high) is labeled "medium"
    #[serde(default = "default_medium_impact")]
    pub medium_impact: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Max journal entries before rotation
    #[serde(default = "default_journal_max")]
    pub max_entries: usize,
}

// Default value functions
fn default_address() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_true() -> bool { true }
fn default_models_dir() -> String { "models".to_string() }
fn default_reload_interval() -> u64 { 30 }
fn default_top_k() -> usize { 3 }
fn default_high_impact() -> f64 { 0.25 }
fn default_medium_impact() -> f64 { 0.10 }
fn default_journal_max() -> usize { 10_000 }

impl Default for ListenConfig {
    fn default() -> Self {
        Self { address: default_address(), port: default_port(), cors: true }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            hot_reload: true,
            check_interval_secs: default_reload_interval(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { allow_placeholder: true }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            high_impact: default_high_impact(),
            medium_impact: default_medium_impact(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { enabled: true, max_entries: default_journal_max() }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file is not an error:
    /// the service runs with defaults, like the original deployment did.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            info!("Config file '{}' not found, using defaults", path);
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        Ok(config)
    }
}
