//! # Jurisdictions
//!
//! A relying jurisdiction is named by a short code (`SG`, `UAE`, `PK-RSEZ`).
//! The trust matrix and the schema registry are both keyed by it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::Did;

/// A validated, non-empty jurisdiction code.
///
/// Codes are compared exactly as given; `from_issuer()` produces upper-case
/// codes because issuer domains end in lower-case country suffixes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionId(String);

impl JurisdictionId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let s = id.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidJurisdictionId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive the home jurisdiction of an issuer from the last dot-separated
    /// segment of its method-specific id: `did:web:compliance.walkers.sg` is
    /// `SG`. Returns `None` for identifiers with no usable segment.
    pub fn from_issuer(issuer: &Did) -> Option<Self> {
        let host = issuer
            .method_specific_id()
            .split(':')
            .next()
            .unwrap_or_default();
        let tld = host.rsplit('.').next().unwrap_or_default();
        if tld.is_empty() || tld == host {
            return None;
        }
        Self::new(tld.to_ascii_uppercase()).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JurisdictionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JurisdictionId> for String {
    fn from(id: JurisdictionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JurisdictionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
