//! Nullifier derivation.
//!
//! `nullifier = SHA-256("<subject_did>:<salt>")`, lowercase hex. Two proofs
//! for the same subject and salt share a nullifier, so reuse is linkable
//! without the subject's identity appearing in the proof.

use urk_core::sha256_text;

use crate::error::ZkError;

pub fn derive_nullifier(subject_did: &str, salt: &str) -> Result<String, ZkError> {
    if subject_did.is_empty() || salt.is_empty() {
        return Err(ZkError::MissingNullifierInputs);
    }
    Ok(sha256_text(&format!("{subject_did}:{salt}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullifier_is_deterministic() {
        let a = derive_nullifier("did:example:alice", "s3cret").unwrap();
        let b = derive_nullifier("did:example:alice", "s3cret").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, sha256_text("did:example:alice:s3cret"));
    }

    #[test]
    fn test_nullifier_depends_on_both_inputs() {
        let base = derive_nullifier("did:example:alice", "salt").unwrap();
        assert_ne!(base, derive_nullifier("did:example:bob", "salt").unwrap());
        assert_ne!(base, derive_nullifier("did:example:alice", "pepper").unwrap());
    }

    #[test]
    fn test_nullifier_does_not_contain_did() {
        let n = derive_nullifier("did:example:alice", "salt").unwrap();
        assert!(!n.contains("alice"));
        assert_eq!(n.len(), 64);
    }

    #[test]
    fn test_missing_inputs() {
        assert!(matches!(derive_nullifier("", "salt"), Err(ZkError::MissingNullifierInputs)));
        assert!(matches!(derive_nullifier("did:example:a", ""), Err(ZkError::MissingNullifierInputs)));
    }
}
