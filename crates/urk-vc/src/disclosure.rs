//! Selective disclosure, applied to the subject before signing.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Always disclosed, whatever the caller requests.
pub const MANDATORY_FIELDS: [&str; 3] = ["id", "trustScore", "complianceLevel"];

/// Keep only `requested ∪ MANDATORY_FIELDS ∪ implicit`. Requested names
/// absent from the subject are ignored.
pub fn apply_disclosure(subject: Map<String, Value>, requested: &[String], implicit: &[&str]) -> Map<String, Value> {
    let allowed: BTreeSet<&str> = MANDATORY_FIELDS
        .iter()
        .copied()
        .chain(implicit.iter().copied())
        .chain(requested.iter().map(String::as_str))
        .collect();
    subject
        .into_iter()
        .filter(|(key, _)| allowed.contains(key.as_str()))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn disclosed_keys_are_intersection(
            present in prop::collection::btree_set("[a-z]{1,6}", 0..12),
            requested in prop::collection::vec("[a-z]{1,6}", 0..8),
        ) {
            let mut subject: Map<String, Value> = present.iter().map(|k| (k.clone(), Value::Bool(true))).collect();
            for field in MANDATORY_FIELDS {
                subject.insert(field.to_string(), Value::Null);
            }
            let out = apply_disclosure(subject.clone(), &requested, &[]);

            for field in MANDATORY_FIELDS {
                prop_assert!(out.contains_key(field));
            }
            for key in out.keys() {
                prop_assert!(MANDATORY_FIELDS.contains(&key.as_str()) || requested.contains(key));
                prop_assert!(subject.contains_key(key));
            }
            for key in &requested {
                prop_assert_eq!(out.contains_key(key), subject.contains_key(key));
            }
        }
    }
}
