//! ISO 20022 party fields derived from KYC attributes.
//!
//! `legalName` → `Nm { FrstNm, Srnm }` (first token / remaining tokens) and
//! `address` → `PstlAdr { StrtNm }`. Relying jurisdictions with ISO-shaped
//! subject schemas require these.

use serde_json::{json, Map, Value};

/// Add `Nm` and `PstlAdr` to `subject` where the source attributes exist.
/// Existing values are left alone.
pub fn apply_party_mapping(subject: &mut Map<String, Value>) {
    if !subject.contains_key("Nm") {
        if let Some(name) = subject.get("legalName").and_then(Value::as_str) {
            if let Some(nm) = name_fields(name) {
                subject.insert("Nm".into(), nm);
            }
        }
    }
    if !subject.contains_key("PstlAdr") {
        if let Some(street) = subject
            .get("address")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let adr = json!({ "StrtNm": street });
            subject.insert("PstlAdr".into(), adr);
        }
    }
}

fn name_fields(legal_name: &str) -> Option<Value> {
    let mut tokens = legal_name.split_whitespace();
    let first = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();
    let mut nm = Map::new();
    nm.insert("FrstNm".into(), Value::String(first.to_string()));
    if !rest.is_empty() {
        nm.insert("Srnm".into(), Value::String(rest.join(" ")));
    }
    Some(Value::Object(nm))
}
