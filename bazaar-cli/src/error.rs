//! Error types for the CLI.

use bazaar_cache::CacheError;
use bazaar_client::ClientError;
use bazaar_core::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type CliResult<T> = Result<T, CliError>;
