use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The persisted chain failed verification, or no longer extends the
    /// blocks this handle has already seen.
    #[error("ledger corruption at sequence {sequence}")]
    Corruption { sequence: u64 },

    /// The ledger file exists but is not a JSON array of blocks.
    #[error("unreadable ledger file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("payload canonicalization failed: {0}")]
    Canonicalization(#[from] urk_core::CanonicalizationError),

    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ledger append task failed: {0}")]
    Blocking(String),
}
