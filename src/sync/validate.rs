//! Integrity checking for collections, including foreign ones.
//!
//! The check runs over the JSON representation rather than the typed model so
//! that documents with missing or mistyped fields yield a complete list of
//! human-readable findings instead of aborting at the first parse error.
//! Validation never short-circuits: every record is checked and every
//! violation reported.

use chrono::DateTime;
use serde_json::Value;

use crate::model::Prompt;

/// Result of an integrity check: overall verdict plus every finding.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check a typed collection, e.g. before export.
pub fn validate_collection(prompts: &[Prompt]) -> IntegrityReport {
    match serde_json::to_value(prompts) {
        Ok(value) => validate_data_integrity(&value),
        Err(e) => IntegrityReport::from_errors(vec![format!("Data is not serializable: {}", e)]),
    }
}

/// Check a raw JSON collection, e.g. the `prompts` field of an incoming
/// document.
///
/// Each record must carry a non-empty id, title, and content; a record that
/// carries metadata must also have a model tag, a parseable `createdAt`, and a
/// token estimate. Findings are tagged with the record's position or title.
pub fn validate_data_integrity(prompts: &Value) -> IntegrityReport {
    let Some(records) = prompts.as_array() else {
        return IntegrityReport::from_errors(vec!["Data is not an array".to_string()]);
    };

    let mut errors = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if is_blank(record.get("id")) {
            errors.push(format!("Prompt at index {} missing ID", index));
        }
        if is_blank(record.get("title")) {
            errors.push(format!("Prompt at index {} missing title", index));
        }
        if is_blank(record.get("content")) {
            errors.push(format!("Prompt at index {} missing content", index));
        }

        let Some(metadata) = record.get("metadata").filter(|m| !m.is_null()) else {
            continue;
        };
        let label = record
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("<untitled>");
        if is_blank(metadata.get("model")) {
            errors.push(format!("Prompt \"{}\" missing model in metadata", label));
        }
        if !has_valid_timestamp(metadata.get("createdAt")) {
            errors.push(format!(
                "Prompt \"{}\" has invalid createdAt timestamp",
                label
            ));
        }
        if metadata.get("tokenEstimate").is_none_or(Value::is_null) {
            errors.push(format!("Prompt \"{}\" missing token estimate", label));
        }
    }

    IntegrityReport::from_errors(errors)
}

/// Missing, null, empty-string, zero, and false all count as absent, so a
/// record with `"id": 0` or `"title": ""` is flagged the same way as one
/// without the field.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    }
}

fn has_valid_timestamp(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}
