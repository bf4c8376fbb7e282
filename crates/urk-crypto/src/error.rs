use thiserror::Error;

/// Error in a single cryptographic operation.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key parsing or encoding failed.
    #[error("key error: {0}")]
    KeyError(String),
}

/// Error from the issuer key store.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// No key pair is held for this issuer.
    #[error("unknown issuer: {0}")]
    UnknownIssuer(String),

    /// The store is in production mode and refuses to mint key material.
    #[error("key generation forbidden in production mode for issuer {0}")]
    KeyGenerationForbidden(String),

    /// The keystore file exists but cannot be trusted.
    #[error("keystore corruption in {path}: {reason}")]
    KeystoreCorruption {
        path: String,
        reason: String,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("keystore I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keystore serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
