use geodrop_claims::ClaimError;
use thiserror::Error;

pub type SettlementResult<T> = Result<T, SettlementError>;

/// Failure reported by a [`crate::SettlementBackend`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Worth retrying: network hiccup, congested ledger, rate limit
    #[error("Transient settlement failure: {0}")]
    Transient(String),

    /// Retrying cannot help: rejected transfer, insufficient funds
    #[error("Settlement rejected: {0}")]
    Permanent(String),
}

/// Errors that can occur while settling a claimed drop
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("Settlement backend rejected the transfer: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
