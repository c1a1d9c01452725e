use thiserror::Error;

use crate::models::Platform;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed store row: {0}")]
    MalformedRow(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported platform for URL: {0}")]
    UnsupportedPlatform(String),

    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("No extraction recipe for {0} (requires script rendering)")]
    ExtractionGap(Platform),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
