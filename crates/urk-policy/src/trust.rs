//! # Issuer Trust
//!
//! Two read-only tables, both loaded at startup:
//!
//! - **`TrustRegistry`**: issuer DID → display metadata. Populated from the
//!   configured issuer list, then an optional providers file, then any
//!   remaining key store issuers. DID-only entries get derived metadata
//!   (`did:web:compliance.walkers.sg` → name `Walkers`, jurisdiction `SG`,
//!   tier `TIER_1`). A providers file entry replaces a derived record for the
//!   same DID.
//! - **`TrustMatrix`**: jurisdiction → issuers it relies on. `*` trusts every
//!   issuer for that jurisdiction.
//!
//! Later edits to the configuration files are not observed until restart.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use urk_core::{Did, JurisdictionId, ValidationError};

pub const DEFAULT_PROVIDER_TIER: &str = "TIER_1";
const WILDCARD: &str = "*";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Strict mode lookup for an issuer with no provider record.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Display metadata for one issuing authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub name: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
}

impl ProviderRecord {
    /// Metadata derived from the DID alone.
    pub fn derived(did: &Did) -> Self {
        Self {
            id: did.to_string(),
            name: derive_name(did),
            tier: DEFAULT_PROVIDER_TIER.to_string(),
            jurisdiction: JurisdictionId::from_issuer(did).map(String::from),
        }
    }
}

/// Second-to-last dot segment of the host, capitalised. Falls back to the
/// full DID when the host has no dots.
fn derive_name(did: &Did) -> String {
    let host = did
        .method_specific_id()
        .split(':')
        .next()
        .unwrap_or_default();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return did.to_string();
    }
    let segment = parts[parts.len() - 2];
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => did.to_string(),
    }
}

/// Providers file entry. Only `id` is required.
#[derive(Debug, Deserialize)]
struct ProviderEntry {
    id: Did,
    name: Option<String>,
    tier: Option<String>,
    jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrustRegistry {
    providers: BTreeMap<String, ProviderRecord>,
}

impl TrustRegistry {
    /// Build the registry from its three sources.
    pub fn load(
        configured: &[Did],
        providers_file: Option<&Path>,
        keystore_issuers: &[Did],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for did in configured {
            registry.insert_derived(did);
        }
        if let Some(path) = providers_file {
            for entry in read_config::<Vec<ProviderEntry>>(path)? {
                let mut record = ProviderRecord::derived(&entry.id);
                if let Some(name) = entry.name {
                    record.name = name;
                }
                if let Some(tier) = entry.tier {
                    record.tier = tier;
                }
                if entry.jurisdiction.is_some() {
                    record.jurisdiction = entry.jurisdiction;
                }
                registry.providers.insert(record.id.clone(), record);
            }
        }
        for did in keystore_issuers {
            registry.insert_derived(did);
        }
        tracing::info!(providers = registry.providers.len(), "trust registry loaded");
        Ok(registry)
    }

    pub fn from_records(records: impl IntoIterator<Item = ProviderRecord>) -> Self {
        Self {
            providers: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    fn insert_derived(&mut self, did: &Did) {
        self.providers
            .entry(did.to_string())
            .or_insert_with(|| ProviderRecord::derived(did));
    }

    pub fn get_provider(&self, id: &str) -> Option<&ProviderRecord> {
        self.providers.get(id)
    }

    /// Lookup that turns a miss into an error when `strict` is set.
    pub fn resolve(&self, id: &str, strict: bool) -> Result<Option<&ProviderRecord>, RegistryError> {
        match self.providers.get(id) {
            Some(record) => Ok(Some(record)),
            None if strict => Err(RegistryError::UnknownProvider(id.to_string())),
            None => Ok(None),
        }
    }

    /// All records, ordered by DID.
    pub fn providers(&self) -> Vec<ProviderRecord> {
        self.providers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Jurisdiction → accepted issuers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustMatrix(BTreeMap<String, BTreeSet<String>>);

impl TrustMatrix {
    /// Load from a JSON or YAML object. A missing file is an empty matrix,
    /// which trusts nobody.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "trust matrix not found; no issuer is trusted");
            return Ok(Self::default());
        }
        let matrix: Self = read_config(path)?;
        tracing::info!(jurisdictions = matrix.0.len(), "trust matrix loaded");
        Ok(matrix)
    }

    pub fn from_entries<J, I, S>(entries: impl IntoIterator<Item = (J, I)>) -> Self
    where
        J: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(j, issuers)| (j.into(), issuers.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    pub fn is_trusted(&self, jurisdiction: &JurisdictionId, issuer: &str) -> bool {
        self.0
            .get(jurisdiction.as_str())
            .is_some_and(|set| set.contains(WILDCARD) || set.contains(issuer))
    }

    pub fn trusted_issuers(&self, jurisdiction: &JurisdictionId) -> Vec<String> {
        self.0
            .get(jurisdiction.as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// YAML is a superset of JSON, so one parser covers both file flavours.
fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|e| RegistryError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
