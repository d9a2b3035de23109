use config_manager::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoldRushError {
    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{0}")]
    Config(#[from] ConfigurationError),

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },
}
