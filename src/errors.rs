use thiserror::Error;
use uuid::Uuid;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("expense not found: {0}")]
    NotFound(Uuid),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("missing or invalid owner identity")]
    Unauthorized,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    /// True for failures recoverable by the offline-queue fallback.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
