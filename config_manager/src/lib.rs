use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Slack allowed between the per-request timeout and the scan deadline
const TIMEOUT_MARGIN_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("Server configuration error: Missing API Key")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// GoldRush (Covalent) indexing API configuration
    pub goldrush: GoldRushConfig,

    /// Pagination and time budget for volume scans
    pub scan: ScanConfig,

    /// API server configuration
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Include per-page trace lines in API responses by default
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldRushConfig {
    /// API key; may be left empty at load time, scans then fail with a configuration error
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Currency the upstream quotes values in
    pub quote_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Wall-clock budget for one (chain, address) scan in milliseconds
    pub deadline_ms: u64,

    /// Maximum pages fetched per endpoint
    pub max_pages: u32,

    /// Items requested per page
    pub page_size: u32,

    /// Chains scanned when a wallet request names none (names or numeric ids)
    pub default_chains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings { debug_mode: false },
            goldrush: GoldRushConfig {
                api_key: "".to_string(), // Must be set in .env or config file
                base_url: "https://api.covalenthq.com/v1".to_string(),
                request_timeout_ms: 9000,
                quote_currency: "USD".to_string(),
            },
            scan: ScanConfig {
                deadline_ms: 8500,
                max_pages: 5,
                page_size: 100,
                default_chains: [
                    "ethereum", "base", "arbitrum", "optimism", "bsc", "polygon", "avalanche",
                    "solana", "zora", "scroll", "blast", "fantom",
                ]
                .iter()
                .map(|chain| chain.to_string())
                .collect(),
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
        }
    }
}

impl GoldRushConfig {
    /// The API key, or the configuration error every scan must surface
    pub fn require_api_key(&self) -> Result<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }
        Ok(key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate GoldRush configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "GoldRush base URL is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl ScanConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Validate scan limits
    pub fn validate(&self) -> Result<()> {
        if self.deadline_ms == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Scan deadline must be greater than 0".to_string(),
            ));
        }

        if self.max_pages == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Page cap must be at least 1".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Page size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        // Add config file if it exists
        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // Add environment variables with prefix, e.g. VOLUME__SCAN__MAX_PAGES
        config_builder = config_builder.add_source(
            Environment::with_prefix("VOLUME")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.default_chains"),
        );

        // The credential is conventionally exported on its own
        if let Ok(api_key) = std::env::var("COVALENT_API_KEY") {
            config_builder = config_builder.set_override("goldrush.api_key", api_key)?;
        }

        let system_config: SystemConfig = config_builder.build()?.try_deserialize()?;

        if system_config.goldrush.require_api_key().is_err() {
            warn!("⚠️ GoldRush API key is not set; every scan will fail until COVALENT_API_KEY is provided");
        }

        // Validate configuration
        system_config.validate()?;

        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate individual components
        self.goldrush.validate()?;
        self.scan.validate()?;

        if self.goldrush.request_timeout_ms > self.scan.deadline_ms + TIMEOUT_MARGIN_MS {
            return Err(ConfigurationError::InvalidValue(format!(
                "Request timeout ({}ms) must not exceed the scan deadline ({}ms) by more than {}ms",
                self.goldrush.request_timeout_ms, self.scan.deadline_ms, TIMEOUT_MARGIN_MS
            )));
        }

        if self.api.port == 0 {
            return Err(ConfigurationError::InvalidValue(
                "API port cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
