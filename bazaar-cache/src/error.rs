//! Cache error types.

use bazaar_core::FetchError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The fetcher failed. Displays the server's message unchanged.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CacheError {
    /// HTTP status behind the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CacheError::Fetch(err) => err.status,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
