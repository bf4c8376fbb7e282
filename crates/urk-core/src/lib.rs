//! # urk-core — Foundational Types for the Reliance Kernel
//!
//! Every other crate in the workspace depends on `urk-core`; it depends on
//! nothing internal. It defines the primitives that the credential lifecycle
//! relies on for byte-exact determinism:
//!
//! 1. **`CanonicalBytes`.** Every signature and every ledger `data_hash` is
//!    computed over RFC 8785 (JCS) bytes produced by `CanonicalBytes::new()`.
//!    Floats are rejected so the same document always yields the same bytes.
//!
//! 2. **UTC-only timestamps.** `Timestamp` renders as `YYYY-MM-DDTHH:MM:SSZ`
//!    so `issuanceDate` and ledger timestamps canonicalize identically on
//!    every node.
//!
//! 3. **Validated identifiers.** `Did`, `JurisdictionId` and `CredentialId`
//!    are newtypes with checked constructors. No bare strings cross crate
//!    boundaries where an identifier is meant.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `urk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod jurisdiction;
pub mod persist;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, sha256_text, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{CredentialId, Did};
pub use jurisdiction::JurisdictionId;
pub use temporal::Timestamp;
