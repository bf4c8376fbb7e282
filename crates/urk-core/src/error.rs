//! # Error Types
//!
//! Error enums for the foundational layer. Higher crates define their own
//! `thiserror` enums and wrap these with `#[from]`.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A value failed construction-time validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to `did:<method>:<identifier>`.
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    #[error("invalid jurisdiction ID: must be non-empty")]
    InvalidJurisdictionId,

    /// Credential identifier is not a `urn:uuid:` URN.
    #[error("invalid credential ID: \"{0}\" (expected urn:uuid:<uuid>)")]
    InvalidCredentialId(String),

    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
