//! Error types for the Talespin domain.
//!
//! Prompt assembly itself never fails: missing or malformed settings degrade
//! to documented fallbacks. Errors only exist at the snapshot boundary, where
//! callers hand character and history data to the engine.

use thiserror::Error;

/// The top-level error type for Talespin snapshot handling.
#[derive(Debug, Error)]
pub enum Error {
    // --- Snapshot errors ---
    #[error("Invalid {what} snapshot: {reason}")]
    InvalidSnapshot { what: String, reason: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            what: what.into(),
            reason: reason.into(),
        }
    }
}
