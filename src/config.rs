use bigdecimal::BigDecimal;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_slow_statement_secs")]
    pub slow_statement_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that storage paths in file records are relative to
    pub root: String,
}

/// Company-independent pricing fallbacks and classifier keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_loss_pct")]
    pub default_loss_pct: BigDecimal,
    #[serde(default = "default_sheet_margin_pct")]
    pub default_sheet_margin_pct: BigDecimal,
    #[serde(default = "default_hardware_margin_pct")]
    pub default_hardware_margin_pct: BigDecimal,
    #[serde(default = "default_hardware_keywords")]
    pub hardware_keywords: Vec<String>,
    /// Max in-flight per-item pricing lookups
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,
}

fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/promob_budget".to_string())
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn default_slow_statement_secs() -> u64 {
    5
}

fn default_loss_pct() -> BigDecimal {
    BigDecimal::from(10)
}

fn default_sheet_margin_pct() -> BigDecimal {
    BigDecimal::from(40)
}

fn default_hardware_margin_pct() -> BigDecimal {
    BigDecimal::from(30)
}

/// Portuguese fitting terms, with and without cedilla
pub fn default_hardware_keywords() -> Vec<String> {
    ["ferragem", "puxador", "dobradiça", "dobradica", "corrediça", "corredica"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_concurrency() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_insert_chunk_size() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            slow_statement_secs: default_slow_statement_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "./uploads".to_string(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_loss_pct: default_loss_pct(),
            default_sheet_margin_pct: default_sheet_margin_pct(),
            default_hardware_margin_pct: default_hardware_margin_pct(),
            hardware_keywords: default_hardware_keywords(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            insert_chunk_size: default_insert_chunk_size(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `config/promob-budget.toml`, then `PROMOB__*` env vars
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", default_database_url())?
            .set_default("storage.root", "./uploads")?
            .add_source(File::with_name("config/promob-budget").required(false))
            .add_source(Environment::with_prefix("PROMOB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
