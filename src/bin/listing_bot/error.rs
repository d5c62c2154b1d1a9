//! Error types for the listing bot.

use market_watch::{error::ProviderError, query::AssetLookupError};

use crate::config::ConfigError;

/// Main error type for the listing bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(#[from] url::ParseError),

    #[error("Unable to fetch orders: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    AssetLookup(#[from] AssetLookupError),

    #[error("Unable to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Unable to listen for the shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
