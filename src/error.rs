use thiserror::Error;

pub type Result<T> = std::result::Result<T, StashError>;

/// Crate-wide error type.
///
/// The import protocol has its own taxonomy: everything up to a successful
/// backup aborts with a plain variant (`RejectedFile`, `BackupFailed`), while
/// failures after the backup are reported through `RolledBack` (the previous
/// collection was restored) or `CriticalRestoreFailure` (it was not, and the
/// stored data is in an indeterminate state).
#[derive(Error, Debug)]
pub enum StashError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    /// The supplied file name does not end in `.json`; rejected before any
    /// processing.
    #[error("Not a JSON file: {0}")]
    RejectedFile(String),

    /// The pre-import backup could not be written. The import never started.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// The import payload is not syntactically valid JSON.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The document parsed but failed structural or integrity validation.
    /// Every violation is collected, not just the first.
    #[error("Invalid document: {}", .0.join("; "))]
    InvalidDocument(Vec<String>),

    /// The import failed after the backup succeeded, and the previous
    /// collection was restored from it.
    #[error("Import failed ({source}); previous collection restored from backup")]
    RolledBack {
        #[source]
        source: Box<StashError>,
    },

    /// The import failed and the backup restore failed too. The live
    /// collection may be inconsistent with its pre-import state; manual
    /// intervention is required.
    #[error("Import failed ({import_error}) and backup restore failed ({restore_error}); stored data may be inconsistent")]
    CriticalRestoreFailure {
        import_error: String,
        restore_error: String,
    },
}
