use thiserror::Error;

use crate::traits::ProofError;

#[derive(Error, Debug)]
pub enum ZkError {
    /// A required witness field is absent.
    #[error("invalid witness: missing {0}")]
    InvalidWitness(&'static str),

    /// Net worth is below the tier threshold.
    #[error("solvency check failed: net worth below {tier} threshold ({threshold} USD)")]
    SolvencyCheckFailed { tier: String, threshold: u64 },

    #[error("subject DID and salt are required for nullifier derivation")]
    MissingNullifierInputs,

    #[error(transparent)]
    Proof(#[from] ProofError),
}
