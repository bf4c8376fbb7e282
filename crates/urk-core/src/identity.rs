//! # Identifiers
//!
//! `Did` names issuers and subjects; `CredentialId` names credentials. Both
//! validate at construction and at deserialization, so a malformed value
//! never reaches the key store or the revocation registry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// W3C Decentralized Identifier.
///
/// Format: `did:<method>:<method-specific-id>`, where method is lowercase
/// alphanumeric and the method-specific id is non-empty.
///
/// Reference: <https://www.w3.org/TR/did-core/#did-syntax>
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let (method, identifier) = split_did(&s).ok_or_else(|| ValidationError::InvalidDid(s.clone()))?;
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            || identifier.is_empty()
        {
            return Err(ValidationError::InvalidDid(s));
        }
        Ok(Self(s))
    }

    /// A fresh `did:example:<uuid>` subject identifier.
    pub fn generate_example() -> Self {
        Self(format!("did:example:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (`web` in `did:web:example.com`).
    pub fn method(&self) -> &str {
        split_did(&self.0).map(|(m, _)| m).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        split_did(&self.0).map(|(_, id)| id).unwrap_or_default()
    }

    /// The verification method this issuer signs with: `<did>#key-1`.
    pub fn key_id(&self) -> String {
        format!("{}#key-1", self.0)
    }
}

fn split_did(s: &str) -> Option<(&str, &str)> {
    s.strip_prefix("did:")?.split_once(':')
}

impl TryFrom<String> for Did {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credential identifier, always rendered as `urn:uuid:<v4>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(Uuid);

impl CredentialId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse `urn:uuid:<uuid>`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let raw = s
            .strip_prefix("urn:uuid:")
            .ok_or_else(|| ValidationError::InvalidCredentialId(s.to_string()))?;
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ValidationError::InvalidCredentialId(s.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<String> for CredentialId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CredentialId> for String {
    fn from(id: CredentialId) -> Self {
        id.to_string()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "urn:uuid:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_valid() {
        let did = Did::new("did:web:compliance.walkers.sg").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.method_specific_id(), "compliance.walkers.sg");
        assert_eq!(did.key_id(), "did:web:compliance.walkers.sg#key-1");
    }

    #[test]
    fn test_did_identifier_may_contain_colons() {
        let did = Did::new("did:web:example.com:users:alice").unwrap();
        assert_eq!(did.method_specific_id(), "example.com:users:alice");
    }

    #[test]
    fn test_did_rejects_malformed() {
        for bad in ["", "did:", "did:web", "did:web:", "did::abc", "did:Web:x", "web:x:y"] {
            assert!(
                matches!(Did::new(bad), Err(ValidationError::InvalidDid(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_did_serde_validates() {
        let ok: Did = serde_json::from_str("\"did:key:z6Mk\"").unwrap();
        assert_eq!(ok.as_str(), "did:key:z6Mk");
        assert!(serde_json::from_str::<Did>("\"not-a-did\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"did:key:z6Mk\"");
    }

    #[test]
    fn test_generated_example_did_is_valid() {
        let did = Did::generate_example();
        assert_eq!(did.method(), "example");
        assert!(Did::new(did.as_str()).is_ok());
        assert_ne!(did, Did::generate_example());
    }

    #[test]
    fn test_credential_id_format() {
        let id = CredentialId::new();
        let s = id.to_string();
        assert!(s.starts_with("urn:uuid:"));
        assert_eq!(CredentialId::parse(&s).unwrap(), id);
    }

    #[test]
    fn test_credential_id_rejects_bare_uuid() {
        let bare = Uuid::new_v4().to_string();
        assert!(CredentialId::parse(&bare).is_err());
        assert!(CredentialId::parse("urn:uuid:zzz").is_err());
    }

    #[test]
    fn test_credential_ids_unique() {
        assert_ne!(CredentialId::new(), CredentialId::new());
    }
}
