//! # Subject Schemas
//!
//! A relying jurisdiction may register the shape it requires of a
//! credential subject. One file per jurisdiction, `<JURISDICTION>.json`:
//!
//! ```json
//! { "required": ["legalName", "Nm"], "properties": { "Nm": { "required": ["FrstNm", "Srnm"] } } }
//! ```
//!
//! Top-level `required` fields must be present and non-null. For each entry
//! in `properties` with its own `required` list, the sub-fields are checked
//! only when the parent field is present; a parent that is not an object has
//! none of its sub-fields. Jurisdictions without a file accept any subject.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use urk_core::JurisdictionId;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot read schema directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema {path}: {reason}")]
    Invalid { path: String, reason: String },
}

/// The first missing field found, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingField(String),
    MissingSubField { field: String, sub_field: String },
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::MissingSubField { field, sub_field } => {
                write!(f, "Missing required sub-field: {field}.{sub_field}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyRule {
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyRule>,
}

impl SubjectSchema {
    pub fn check(&self, subject: &Map<String, Value>) -> Result<(), SchemaViolation> {
        for field in &self.required {
            if present(subject.get(field)).is_none() {
                return Err(SchemaViolation::MissingField(field.clone()));
            }
        }
        for (field, rule) in &self.properties {
            let Some(value) = present(subject.get(field)) else {
                continue;
            };
            let nested = value.as_object();
            for sub_field in &rule.required {
                if present(nested.and_then(|o| o.get(sub_field))).is_none() {
                    return Err(SchemaViolation::MissingSubField {
                        field: field.clone(),
                        sub_field: sub_field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SubjectSchema>,
}

impl SchemaRegistry {
    /// Load every `*.json` file in `dir`; the file stem is the jurisdiction.
    /// A missing directory is an empty registry.
    pub fn load_dir(dir: &Path) -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        if !dir.exists() {
            tracing::info!(dir = %dir.display(), "no schema directory; all jurisdictions accept any subject");
            return Ok(registry);
        }
        let io_err = |source| SchemaError::Io {
            path: dir.display().to_string(),
            source,
        };
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(jurisdiction) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let invalid = |reason: String| SchemaError::Invalid {
                path: path.display().to_string(),
                reason,
            };
            let raw = std::fs::read_to_string(&path).map_err(|e| invalid(e.to_string()))?;
            let schema: SubjectSchema = serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
            registry.schemas.insert(jurisdiction.to_string(), schema);
        }
        tracing::info!(schemas = registry.schemas.len(), "subject schemas loaded");
        Ok(registry)
    }

    pub fn insert(&mut self, jurisdiction: &JurisdictionId, schema: SubjectSchema) {
        self.schemas.insert(jurisdiction.to_string(), schema);
    }

    pub fn get(&self, jurisdiction: &JurisdictionId) -> Option<&SubjectSchema> {
        self.schemas.get(jurisdiction.as_str())
    }

    pub fn check(&self, jurisdiction: &JurisdictionId, subject: &Map<String, Value>) -> Result<(), SchemaViolation> {
        match self.get(jurisdiction) {
            Some(schema) => schema.check(subject),
            None => Ok(()),
        }
    }
}
