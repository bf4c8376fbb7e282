//! # urk-policy — Relying-Party Policy
//!
//! Everything a verifier consults besides the signature itself:
//!
//! - [`TrustRegistry`]: issuer metadata, loaded once at startup.
//! - [`TrustMatrix`]: which issuers each jurisdiction accepts.
//! - [`SchemaRegistry`]: required subject fields per jurisdiction.
//! - [`RevocationRegistry`]: revoked credential ids behind a pluggable
//!   [`RevocationStore`] (file, memory, or HTTP key-value service).
//! - [`AuditSampler`]: CSPRNG-driven manual review sampling.

pub mod http_store;
pub mod revocation;
pub mod sampling;
pub mod schema;
pub mod trust;

pub use http_store::HttpRevocationStore;
pub use revocation::{
    FileRevocationStore, MemoryRevocationStore, RevocationError, RevocationOutcome, RevocationRegistry,
    RevocationStore,
};
pub use sampling::{AuditSampler, SamplingDecision};
pub use schema::{SchemaError, SchemaRegistry, SchemaViolation, SubjectSchema};
pub use trust::{ProviderRecord, RegistryError, TrustMatrix, TrustRegistry};
