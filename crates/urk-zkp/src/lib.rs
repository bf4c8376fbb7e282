//! # urk-zkp — Solvency Proofs
//!
//! Turns a private solvency witness (assets, liabilities, a firm commitment
//! over them) into a publishable proof bundle plus a nullifier.
//!
//! The binding contract lives in [`ZkProofEngine`]: witness validation, the
//! tier threshold check, and nullifier derivation. The proof payload itself
//! comes from a [`ProofSystem`] implementation; the only one shipped is
//! [`MockPlonkSystem`], which is **not a proof** and provides no soundness
//! or zero-knowledge property.

pub mod engine;
pub mod error;
pub mod mock;
pub mod nullifier;
pub mod traits;

pub use engine::{
    tier_threshold, PublicSignals, SolvencyProof, SolvencyProofBundle, SolvencyWitness, ZkProofEngine,
    DEFAULT_TIER,
};
pub use error::ZkError;
pub use mock::MockPlonkSystem;
pub use nullifier::derive_nullifier;
pub use traits::{ProofError, ProofSystem};
