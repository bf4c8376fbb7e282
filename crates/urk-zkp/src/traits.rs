//! # Proof System Trait
//!
//! The seam where a real succinct proof backend replaces the placeholder.
//! Implementations receive the public signals and the witness commitment
//! and return the proof payload. They never see raw asset figures.

use thiserror::Error;

use crate::engine::{PublicSignals, SolvencyProof};

#[derive(Error, Debug)]
pub enum ProofError {
    /// The backend could not produce a proof for these inputs.
    #[error("prover error: {0}")]
    ProverError(String),
}

pub trait ProofSystem: Send + Sync {
    /// Protocol tag carried in every proof (`PLONK`).
    fn protocol(&self) -> &'static str;

    /// Curve tag carried in every proof (`bn128`).
    fn curve(&self) -> &'static str;

    fn prove(&self, signals: &PublicSignals, commitment: &str) -> Result<SolvencyProof, ProofError>;
}
