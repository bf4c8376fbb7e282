//! # urk-crypto — Signing Keys for Credential Issuers
//!
//! - **Ed25519** newtypes for public keys and signatures, hex on the wire,
//!   PKCS#8 / SPKI PEM at rest.
//! - **`KeyStore`**: one key pair per issuer DID, persisted to a single
//!   owner-only JSON file. Private key material never leaves the store;
//!   callers get `sign` and `verify`.
//!
//! ## Crate Policy
//!
//! - Depends only on `urk-core` internally.
//! - Signing input is always `&CanonicalBytes`.
//! - No mocking of cryptographic operations in tests.

pub mod ed25519;
pub mod error;
pub mod keystore;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::{CryptoError, KeystoreError};
pub use keystore::{KeyStore, KeyStoreMode};
