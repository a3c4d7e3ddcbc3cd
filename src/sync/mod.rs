//! # Export/Import Protocol
//!
//! Serializes the collection to a versioned JSON document and reconciles an
//! incoming document against the live collection, with backup-and-rollback.
//!
//! ## Document Format
//!
//! ```text
//! { version: "1.0", exportedAt: <date-time>,
//!   statistics: { totalPrompts, averageRating, mostUsedModel, ... },
//!   prompts: [ ... full collection ... ] }
//! ```
//!
//! Exactly one schema version is accepted. There is deliberately no upgrade
//! path for older documents; a version mismatch is a hard rejection. (That
//! strictness is a usability gap for long-lived archives, but it is the
//! contract.)
//!
//! ## Import Safety
//!
//! The import protocol is strictly sequential: snapshot the live collection
//! into the backup slot, then parse, validate, reconcile, and commit as one
//! write. Any failure after a successful backup triggers an automatic restore,
//! so a failed import leaves the persisted collection unchanged. See
//! [`import::run`].
//!
//! ## Conflict Resolution
//!
//! An imported record whose id already exists in the live collection is a
//! duplicate. When duplicates exist the protocol blocks on an external
//! [`ConflictResolver`] (a dialog, a CLI prompt, a test closure) for a
//! [`MergeDecision`]. Existing records are never overwritten by colliding
//! imports; only `Replace` discards them, wholesale and explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Prompt;

pub mod export;
pub mod import;
pub mod stats;
pub mod validate;

pub use export::{ExportFile, ExportOutcome};
pub use import::{ImportFile, ImportOutcome};
pub use stats::{Statistics, TokenTotals};
pub use validate::IntegrityReport;

/// The one schema version this engine reads and writes.
pub const SCHEMA_VERSION: &str = "1.0";

/// A versioned snapshot of the collection plus computed statistics.
/// Created on demand for export, consumed once on import, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub statistics: Statistics,
    pub prompts: Vec<Prompt>,
}

/// Counts shown to the user when an import collides with existing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictInfo {
    pub existing_count: usize,
    pub import_count: usize,
    pub duplicate_count: usize,
}

/// The user's resolution for an id conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Keep every existing record; append only imports with fresh ids.
    Merge,
    /// Discard the live collection and take the imported one verbatim.
    Replace,
    /// Abort the import. Not an error.
    Cancel,
}

/// External collaborator that decides how to resolve an id conflict.
///
/// The engine blocks on this synchronously; the embedding runtime chooses how
/// to suspend (modal dialog, terminal prompt, ...). Implemented for plain
/// closures so tests can pass `|_| MergeDecision::Merge`.
pub trait ConflictResolver {
    fn resolve(&self, conflict: ConflictInfo) -> MergeDecision;
}

impl<F> ConflictResolver for F
where
    F: Fn(ConflictInfo) -> MergeDecision,
{
    fn resolve(&self, conflict: ConflictInfo) -> MergeDecision {
        self(conflict)
    }
}
