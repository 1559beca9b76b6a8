use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger engine and its persistence ports.
///
/// Numeric problems are never reported here: malformed amounts are coerced to
/// zero before they reach any computation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A lifecycle request is missing required data (empty item name, zero price...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller may not perform the operation. Raised before any mutation.
    #[error("Authorization denied: {0}")]
    Unauthorized(String),

    /// The matrix document moved between read and write.
    #[error("Concurrent update: expected version {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    /// The underlying store failed; nothing was written.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// True for failures of the read-modify-write cycle, which the shell may retry.
    pub fn is_persistence(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. } | LedgerError::Persistence(_))
    }
}
