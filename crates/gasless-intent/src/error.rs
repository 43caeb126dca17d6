//! error types for gasless-intent

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // === preconditions, raised before any signing or network activity ===
    #[error("no wallet connected")]
    NoWallet,

    #[error("transaction already in progress")]
    AlreadyInProgress,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // === wallet ===
    /// user declined; the wallet's own message is kept verbatim
    #[error("{0}")]
    SigningRejected(String),

    #[error("signer error: {0}")]
    Signer(String),

    // === relayer ===
    #[error("submission failed with status {status}: {body}")]
    Submission { status: u16, body: String },

    #[error("intent not found: {0}")]
    IntentNotFound(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    // === transport ===
    #[error("network error: {0}")]
    Network(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// preconditions and wallet rejections leave nothing half-done
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NoWallet
                | Error::AlreadyInProgress
                | Error::InvalidRequest(_)
                | Error::SigningRejected(_)
        )
    }
}
