//! Export: serialize the live collection into a download-ready document.

use chrono::Utc;

use super::stats::Statistics;
use super::validate::validate_collection;
use super::{ExportDocument, SCHEMA_VERSION};
use crate::error::{Result, StashError};
use crate::store::{PromptStore, StorageBackend};

/// A document ready to hand to the embedding runtime for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `prompt-library-backup-<timestamp>.json`, colons flattened so the name
    /// survives every filesystem.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// What happened when an export was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    File(ExportFile),
    /// Nothing to export; no document was produced.
    Empty,
    /// The integrity check found problems and the caller chose not to
    /// proceed. The findings are returned for display.
    Declined { warnings: Vec<String> },
}

/// Export the full collection as a pretty-printed JSON document.
///
/// An empty collection short-circuits to [`ExportOutcome::Empty`]. If the
/// pre-export integrity check finds problems, `confirm` is consulted with the
/// findings; exporting a collection with known defects is allowed but must be
/// deliberate.
pub fn run<B, F>(store: &PromptStore<B>, confirm: F) -> Result<ExportOutcome>
where
    B: StorageBackend,
    F: FnOnce(&[String]) -> bool,
{
    let prompts = store.list()?;
    if prompts.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let report = validate_collection(&prompts);
    if !report.valid {
        tracing::warn!(
            findings = report.errors.len(),
            "exporting collection with integrity findings"
        );
        if !confirm(&report.errors) {
            return Ok(ExportOutcome::Declined {
                warnings: report.errors,
            });
        }
    }

    let now = Utc::now();
    let document = ExportDocument {
        version: SCHEMA_VERSION.to_string(),
        exported_at: now,
        statistics: Statistics::compute(&prompts),
        prompts,
    };
    let bytes = serde_json::to_vec_pretty(&document).map_err(StashError::Serialization)?;
    let filename = format!(
        "prompt-library-backup-{}.json",
        now.format("%Y-%m-%dT%H-%M-%S")
    );

    Ok(ExportOutcome::File(ExportFile { filename, bytes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::Value;

    fn store_with(titles: &[&str]) -> PromptStore<MemBackend> {
        let mut s = PromptStore::new(MemBackend::new());
        for title in titles {
            s.create(title, "claude-3", "some content", false).unwrap();
        }
        s
    }

    fn always(_: &[String]) -> bool {
        true
    }

    #[test]
    fn test_empty_collection_yields_empty_outcome() {
        let s = store_with(&[]);
        assert_eq!(run(&s, always).unwrap(), ExportOutcome::Empty);
    }

    #[test]
    fn test_document_shape() {
        let s = store_with(&["One", "Two"]);
        let ExportOutcome::File(file) = run(&s, always).unwrap() else {
            panic!("expected a file");
        };

        let doc: Value = serde_json::from_slice(&file.bytes).unwrap();
        assert_eq!(doc["version"], "1.0");
        assert!(doc["exportedAt"].is_string());
        assert_eq!(doc["statistics"]["totalPrompts"], 2);
        assert_eq!(doc["prompts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_filename_has_no_colons() {
        let s = store_with(&["One"]);
        let ExportOutcome::File(file) = run(&s, always).unwrap() else {
            panic!("expected a file");
        };
        assert!(file.filename.starts_with("prompt-library-backup-"));
        assert!(file.filename.ends_with(".json"));
        assert!(!file.filename.contains(':'));
    }

    #[test]
    fn test_clean_collection_never_consults_confirm() {
        let s = store_with(&["One"]);
        let outcome = run(&s, |_: &[String]| panic!("should not be asked")).unwrap();
        assert!(matches!(outcome, ExportOutcome::File(_)));
    }

    #[test]
    fn test_declined_export_returns_findings() {
        let mut s = store_with(&["Good"]);
        let mut prompts = s.list().unwrap();
        prompts[0].title = String::new();
        s.replace_collection(prompts).unwrap();

        let outcome = run(&s, |_: &[String]| false).unwrap();
        let ExportOutcome::Declined { warnings } = outcome else {
            panic!("expected decline");
        };
        assert!(warnings.iter().any(|w| w.contains("missing title")));
    }

    #[test]
    fn test_confirmed_export_proceeds_despite_findings() {
        let mut s = store_with(&["Good"]);
        let mut prompts = s.list().unwrap();
        prompts[0].title = String::new();
        s.replace_collection(prompts).unwrap();

        let outcome = run(&s, |_: &[String]| true).unwrap();
        assert!(matches!(outcome, ExportOutcome::File(_)));
    }
}
