use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::registry::ClassMetadata;
use super::theorem::Theorem;

/// Reads a class list document. Entries that do not decode are skipped with a warning.
///
/// Accepts `{"class_list": {id: {...}}}` as well as a bare `{id: {...}}` map. Entries keep
/// their order in the file.
pub(super) fn parse_class_list(raw: &str) -> Result<(Vec<(String, ClassMetadata)>, usize)> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in class list")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("class list must be a JSON object"))?;

    let class_map = match object.get("class_list") {
        Some(inner) => inner
            .as_object()
            .ok_or_else(|| anyhow!("'class_list' must be a JSON object"))?,
        None => object,
    };

    let mut entries = Vec::with_capacity(class_map.len());
    let mut skipped = 0usize;
    for (id, value) in class_map {
        match ClassMetadata::deserialize(value) {
            Ok(metadata) => entries.push((id.clone(), metadata)),
            Err(error) => {
                warn!(class = %id, %error, "skipping malformed class record");
                skipped += 1;
            }
        }
    }

    Ok((entries, skipped))
}

/// Reads a theorem document. Records that do not decode are skipped with a warning.
///
/// Accepts `{"theorems": [...]}` as well as a bare array.
pub(super) fn parse_theorem_list(raw: &str) -> Result<(Vec<Theorem>, usize)> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in theorem list")?;

    let records = match &parsed {
        Value::Array(records) => records,
        Value::Object(object) => object
            .get("theorems")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("theorem document has no 'theorems' array"))?,
        _ => return Err(anyhow!("theorem list must be a JSON object or array")),
    };

    let mut theorems = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for (index, value) in records.iter().enumerate() {
        match Theorem::deserialize(value) {
            Ok(theorem) => theorems.push(theorem),
            Err(error) => {
                warn!(index, %error, "skipping malformed theorem record");
                skipped += 1;
            }
        }
    }

    Ok((theorems, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_skips_malformed_entries() {
        let raw = r#"{
            "class_list": {
                "P": {"name": "P", "description": "Polynomial time", "see_also": ["NP"]},
                "NP": {"name": "NP", "top": false},
                "BROKEN": {"name": 42}
            }
        }"#;

        let (entries, skipped) = parse_class_list(raw).expect("document parses");
        assert_eq!(skipped, 1);
        let ids = entries.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["P", "NP"]);
        assert_eq!(entries[0].1.see_also, vec!["NP".to_string()]);
    }

    #[test]
    fn class_list_keeps_file_order() {
        let raw = r#"{"class_list": {"PSPACE": {}, "BQP": {}, "P": {}, "AC0": {}}}"#;
        let (entries, _) = parse_class_list(raw).expect("document parses");
        let ids = entries.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["PSPACE", "BQP", "P", "AC0"]);
    }

    #[test]
    fn class_list_accepts_bare_map() {
        let (entries, skipped) = parse_class_list(r#"{"L": {}}"#).expect("document parses");
        assert_eq!(skipped, 0);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn class_list_rejects_non_object() {
        assert!(parse_class_list("[1, 2]").is_err());
        assert!(parse_class_list("not json").is_err());
    }

    #[test]
    fn theorem_list_skips_malformed_records() {
        let raw = r#"{"theorems": [
            {"type": "containment", "small": "P", "large": "NP"},
            {"type": "containment", "small": "P"},
            {"type": "equality", "a": "IP", "b": "PSPACE"},
            {"kind": "equality"}
        ]}"#;

        let (theorems, skipped) = parse_theorem_list(raw).expect("document parses");
        assert_eq!(skipped, 2);
        assert_eq!(
            theorems,
            vec![
                Theorem::containment("P", "NP"),
                Theorem::equality("IP", "PSPACE"),
            ]
        );
    }

    #[test]
    fn theorem_list_requires_array() {
        assert!(parse_theorem_list(r#"{"theorems": {}}"#).is_err());
        assert!(parse_theorem_list("3").is_err());
    }
}
