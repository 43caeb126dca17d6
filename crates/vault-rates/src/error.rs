//! error types for vault-rates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("snapshot source error: {0}")]
    Source(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
