//! # Placeholder PLONK Backend
//!
//! **NOT A PROOF. NOT PRIVATE.** Every field of the returned proof is a
//! SHA-256 digest over the canonical public signals, the witness
//! commitment, and a per-element label. Anyone holding those inputs can
//! recompute it, and nothing about it attests that the prover knows a
//! satisfying witness. It exists so the credential format and the engine's
//! threshold and nullifier contract can be exercised end to end until a real
//! prover is wired in behind [`ProofSystem`].

use urk_core::{sha256_hex, sha256_text, CanonicalBytes, Timestamp};

use crate::engine::{PublicSignals, SolvencyProof};
use crate::traits::{ProofError, ProofSystem};

pub const PROTOCOL: &str = "PLONK";
pub const CURVE: &str = "bn128";

/// Deterministic stand-in for a PLONK prover.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPlonkSystem;

impl MockPlonkSystem {
    fn element(signals_digest: &str, commitment: &str, label: &str) -> String {
        sha256_text(&format!("{label}:{signals_digest}:{commitment}"))
    }
}

impl ProofSystem for MockPlonkSystem {
    fn protocol(&self) -> &'static str {
        PROTOCOL
    }

    fn curve(&self) -> &'static str {
        CURVE
    }

    fn prove(&self, signals: &PublicSignals, commitment: &str) -> Result<SolvencyProof, ProofError> {
        let canonical = CanonicalBytes::new(signals).map_err(|e| ProofError::ProverError(e.to_string()))?;
        let digest = sha256_hex(&canonical);
        let el = |label: &str| Self::element(&digest, commitment, label);

        Ok(SolvencyProof {
            protocol: PROTOCOL.to_string(),
            curve: CURVE.to_string(),
            pi_a: [el("a0"), el("a1")],
            pi_b: [[el("b00"), el("b01")], [el("b10"), el("b11")]],
            pi_c: [el("c0"), el("c1")],
            timestamp: Timestamp::now(),
        })
    }
}
