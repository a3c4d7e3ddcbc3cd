//! Import: reconcile an incoming export document against the live collection.
//!
//! The protocol is backup-first: the live collection is snapshotted before the
//! document is even parsed, and any failure after that point restores the
//! snapshot. A failed import therefore never leaves the collection half
//! written.

use std::collections::HashSet;

use serde_json::Value;

use super::validate::validate_data_integrity;
use super::{ConflictInfo, ConflictResolver, MergeDecision, SCHEMA_VERSION};
use crate::error::{Result, StashError};
use crate::model::Prompt;
use crate::store::{PromptStore, StorageBackend};

/// An uploaded document: the name it arrived under plus its raw bytes.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// How an accepted import changed the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// No id collisions; every imported record was appended.
    Appended { added: usize },
    /// Collisions resolved by merge: existing records kept, non-colliding
    /// imports appended.
    Merged { kept: usize, added: usize },
    /// Collisions resolved by replace: the imported collection is now the
    /// whole collection.
    Replaced { total: usize },
    /// The resolver aborted. The collection is unchanged.
    Cancelled,
}

/// Run the import protocol for one uploaded document.
///
/// A file whose name does not end in `.json` is rejected outright, before the
/// backup is taken. After a successful backup, any parse, validation, or
/// storage failure restores the snapshot and surfaces as
/// [`StashError::RolledBack`]; if the restore itself also fails, both causes
/// surface as [`StashError::CriticalRestoreFailure`] and the collection state
/// is unspecified.
pub fn run<B, R>(store: &mut PromptStore<B>, file: &ImportFile, resolver: &R) -> Result<ImportOutcome>
where
    B: StorageBackend,
    R: ConflictResolver + ?Sized,
{
    if !file.name.to_ascii_lowercase().ends_with(".json") {
        return Err(StashError::RejectedFile(file.name.clone()));
    }

    store.backup()?;

    match apply(store, &file.bytes, resolver) {
        Ok(outcome) => Ok(outcome),
        Err(source) => {
            tracing::warn!(error = %source, "import failed, restoring backup");
            match store.restore() {
                Ok(()) => Err(StashError::RolledBack {
                    source: Box::new(source),
                }),
                Err(restore_error) => Err(StashError::CriticalRestoreFailure {
                    import_error: source.to_string(),
                    restore_error: restore_error.to_string(),
                }),
            }
        }
    }
}

/// Parse, validate, reconcile, commit. Runs entirely under the backup taken
/// by [`run`]; every error path here is rolled back by the caller.
fn apply<B, R>(store: &mut PromptStore<B>, bytes: &[u8], resolver: &R) -> Result<ImportOutcome>
where
    B: StorageBackend,
    R: ConflictResolver + ?Sized,
{
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| StashError::MalformedDocument(e.to_string()))?;

    let mut errors = Vec::new();
    match document.get("version").and_then(Value::as_str) {
        None => errors.push("Missing version number".to_string()),
        Some(v) if v != SCHEMA_VERSION => errors.push(format!(
            "Unsupported version: {}. Expected: {}",
            v, SCHEMA_VERSION
        )),
        Some(_) => {}
    }
    // Presence only; the original never inspects the timestamp's shape.
    if document.get("exportedAt").is_none_or(Value::is_null) {
        errors.push("Missing export timestamp".to_string());
    }
    let incoming = match document.get("prompts") {
        Some(prompts @ Value::Array(_)) => {
            let report = validate_data_integrity(prompts);
            errors.extend(report.errors);
            if errors.is_empty() {
                serde_json::from_value::<Vec<Prompt>>(prompts.clone())
                    .map_err(|e| errors.push(e.to_string()))
                    .ok()
            } else {
                None
            }
        }
        _ => {
            errors.push("Missing or invalid prompts array".to_string());
            None
        }
    };
    let Some(incoming) = incoming else {
        return Err(StashError::InvalidDocument(errors));
    };

    let existing = store.list()?;
    let existing_ids: HashSet<u64> = existing.iter().map(|p| p.id).collect();
    let duplicate_count = incoming
        .iter()
        .filter(|p| existing_ids.contains(&p.id))
        .count();

    if duplicate_count == 0 {
        let added = incoming.len();
        let mut merged = existing;
        merged.extend(incoming);
        store.replace_collection(merged)?;
        return Ok(ImportOutcome::Appended { added });
    }

    let conflict = ConflictInfo {
        existing_count: existing.len(),
        import_count: incoming.len(),
        duplicate_count,
    };
    match resolver.resolve(conflict) {
        MergeDecision::Cancel => Ok(ImportOutcome::Cancelled),
        MergeDecision::Merge => {
            let kept = existing.len();
            let mut merged = existing;
            // Import order is preserved among the survivors.
            let fresh: Vec<Prompt> = incoming
                .into_iter()
                .filter(|p| !existing_ids.contains(&p.id))
                .collect();
            let added = fresh.len();
            merged.extend(fresh);
            store.replace_collection(merged)?;
            Ok(ImportOutcome::Merged { kept, added })
        }
        MergeDecision::Replace => {
            let total = incoming.len();
            store.replace_collection(incoming)?;
            Ok(ImportOutcome::Replaced { total })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::sync::export::{self, ExportOutcome};
    use serde_json::json;

    fn store_with(titles: &[&str]) -> PromptStore<MemBackend> {
        let mut s = PromptStore::new(MemBackend::new());
        for title in titles {
            s.create(title, "claude-3", "some content", false).unwrap();
        }
        s
    }

    fn export_from(titles: &[&str]) -> ImportFile {
        let s = store_with(titles);
        let ExportOutcome::File(file) = export::run(&s, |_| true).unwrap() else {
            panic!("expected a file");
        };
        ImportFile {
            name: file.filename,
            bytes: file.bytes,
        }
    }

    fn json_file(value: serde_json::Value) -> ImportFile {
        ImportFile {
            name: "upload.json".to_string(),
            bytes: serde_json::to_vec(&value).unwrap(),
        }
    }

    // Ids are epoch-derived, so records created by two stores in the same
    // instant can collide. Tests that need collision-free imports derive ids
    // explicitly.
    fn offshoot(base: &Prompt, offset: u64, title: &str) -> Prompt {
        let mut p = base.clone();
        p.id += offset;
        p.title = title.to_string();
        p
    }

    fn merge(_: ConflictInfo) -> MergeDecision {
        MergeDecision::Merge
    }

    fn unreachable_resolver(_: ConflictInfo) -> MergeDecision {
        panic!("resolver should not be consulted")
    }

    #[test]
    fn test_non_json_name_rejected_before_backup() {
        let mut s = store_with(&["Keep"]);
        let file = ImportFile {
            name: "data.txt".to_string(),
            bytes: b"{}".to_vec(),
        };
        let err = run(&mut s, &file, &merge).unwrap_err();
        assert!(matches!(err, StashError::RejectedFile(_)));
        // Rejection happens before the snapshot is taken
        assert!(s.backend().get("prompts_backup").unwrap().is_none());
    }

    #[test]
    fn test_append_when_no_collisions() {
        let mut s = store_with(&["Mine"]);
        let mine = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [
                offshoot(&mine[0], 1_000, "Theirs A"),
                offshoot(&mine[0], 2_000, "Theirs B")
            ]
        }));

        let outcome = run(&mut s, &file, &unreachable_resolver).unwrap();
        assert_eq!(outcome, ImportOutcome::Appended { added: 2 });
        assert_eq!(s.list().unwrap().len(), 3);
    }

    #[test]
    fn test_merge_keeps_existing_and_appends_fresh() {
        let mut s = store_with(&["Mine"]);
        let mine = s.list().unwrap();

        // Incoming shares one id with the live collection
        let mut colliding = mine[0].clone();
        colliding.title = "Imposter".to_string();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [colliding, offshoot(&mine[0], 1_000, "Fresh")]
        }));

        let outcome = run(&mut s, &file, &merge).unwrap();
        assert_eq!(outcome, ImportOutcome::Merged { kept: 1, added: 1 });

        let after = s.list().unwrap();
        assert_eq!(after.len(), 2);
        // The colliding import never overwrites the existing record
        assert_eq!(after[0].title, "Mine");
        assert_eq!(after[1].title, "Fresh");
    }

    #[test]
    fn test_replace_discards_live_collection() {
        let mut s = store_with(&["Mine"]);
        let mine = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [mine[0].clone()]
        }));

        let replace = |_: ConflictInfo| MergeDecision::Replace;
        let outcome = run(&mut s, &file, &replace).unwrap();
        assert_eq!(outcome, ImportOutcome::Replaced { total: 1 });
        assert_eq!(s.list().unwrap().len(), 1);
    }

    #[test]
    fn test_cancel_leaves_collection_unchanged() {
        let mut s = store_with(&["Mine"]);
        let mine = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [mine[0].clone()]
        }));

        let cancel = |_: ConflictInfo| MergeDecision::Cancel;
        let outcome = run(&mut s, &file, &cancel).unwrap();
        assert_eq!(outcome, ImportOutcome::Cancelled);
        assert_eq!(s.list().unwrap()[0].title, "Mine");
    }

    #[test]
    fn test_resolver_sees_counts() {
        let mut s = store_with(&["A", "B"]);
        let mine = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [mine[0].clone()]
        }));

        let seen = std::cell::Cell::new(None);
        let spy = |info: ConflictInfo| {
            seen.set(Some(info));
            MergeDecision::Cancel
        };
        run(&mut s, &file, &spy).unwrap();
        assert_eq!(
            seen.get().unwrap(),
            ConflictInfo {
                existing_count: 2,
                import_count: 1,
                duplicate_count: 1,
            }
        );
    }

    #[test]
    fn test_malformed_json_rolls_back() {
        let mut s = store_with(&["Keep"]);
        let file = ImportFile {
            name: "broken.json".to_string(),
            bytes: b"{ not json".to_vec(),
        };

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback, got {:?}", err);
        };
        assert!(matches!(*source, StashError::MalformedDocument(_)));
        assert_eq!(s.list().unwrap()[0].title, "Keep");
    }

    #[test]
    fn test_missing_version_is_invalid_document() {
        let mut s = store_with(&[]);
        let file = json_file(json!({
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": []
        }));

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback");
        };
        let StashError::InvalidDocument(errors) = *source else {
            panic!("expected invalid document");
        };
        assert!(errors.contains(&"Missing version number".to_string()));
    }

    #[test]
    fn test_non_string_export_timestamp_is_accepted() {
        let mut s = store_with(&[]);
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": 1717200000000u64,
            "prompts": []
        }));

        let outcome = run(&mut s, &file, &unreachable_resolver).unwrap();
        assert_eq!(outcome, ImportOutcome::Appended { added: 0 });
    }

    #[test]
    fn test_null_export_timestamp_is_missing() {
        let mut s = store_with(&[]);
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": null,
            "prompts": []
        }));

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback");
        };
        let StashError::InvalidDocument(errors) = *source else {
            panic!("expected invalid document");
        };
        assert!(errors.contains(&"Missing export timestamp".to_string()));
    }

    #[test]
    fn test_unsupported_version_is_hard_rejection() {
        let mut s = store_with(&[]);
        let file = json_file(json!({
            "version": "2.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": []
        }));

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback");
        };
        let StashError::InvalidDocument(errors) = *source else {
            panic!("expected invalid document");
        };
        assert!(errors.contains(&"Unsupported version: 2.0. Expected: 1.0".to_string()));
    }

    #[test]
    fn test_structural_errors_are_collected_together() {
        let mut s = store_with(&[]);
        let file = json_file(json!({"prompts": "nope"}));

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback");
        };
        let StashError::InvalidDocument(errors) = *source else {
            panic!("expected invalid document");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_integrity_findings_reject_the_document() {
        let mut s = store_with(&["Keep"]);
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [{"id": 99, "title": "", "content": "c"}]
        }));

        let err = run(&mut s, &file, &merge).unwrap_err();
        let StashError::RolledBack { source } = err else {
            panic!("expected rollback");
        };
        let StashError::InvalidDocument(errors) = *source else {
            panic!("expected invalid document");
        };
        assert!(errors.iter().any(|e| e.contains("missing title")));
        assert_eq!(s.list().unwrap()[0].title, "Keep");
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let mut s = store_with(&["Keep"]);
        let keep = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [offshoot(&keep[0], 1_000, "Incoming")]
        }));

        // First write to the live key after the backup is the commit
        s.backend().set_fail_key_once("prompts");
        let err = run(&mut s, &file, &unreachable_resolver).unwrap_err();
        assert!(matches!(err, StashError::RolledBack { .. }));

        let after = s.list().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].title, "Keep");
    }

    #[test]
    fn test_failed_restore_is_critical() {
        let mut s = store_with(&["Keep"]);
        let keep = s.list().unwrap();
        let file = json_file(json!({
            "version": "1.0",
            "exportedAt": "2024-06-01T00:00:00Z",
            "prompts": [offshoot(&keep[0], 1_000, "Incoming")]
        }));

        // Both the commit and the restore write fail
        s.backend().set_fail_key(Some("prompts"));
        let err = run(&mut s, &file, &unreachable_resolver).unwrap_err();
        assert!(matches!(err, StashError::CriticalRestoreFailure { .. }));
    }

    #[test]
    fn test_backup_failure_aborts_before_any_parse() {
        let mut s = store_with(&["Keep"]);
        let file = ImportFile {
            name: "never-parsed.json".to_string(),
            bytes: b"{ not even json".to_vec(),
        };

        s.backend().set_fail_key(Some("prompts_backup"));
        let err = run(&mut s, &file, &merge).unwrap_err();
        assert!(matches!(err, StashError::BackupFailed(_)));
    }

    #[test]
    fn test_roundtrip_export_import_into_empty_store() {
        let file = export_from(&["One", "Two", "Three"]);
        let mut s = store_with(&[]);

        let outcome = run(&mut s, &file, &unreachable_resolver).unwrap();
        assert_eq!(outcome, ImportOutcome::Appended { added: 3 });
        let titles: Vec<_> = s
            .list()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }
}
