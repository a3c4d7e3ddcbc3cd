use crate::error::Result;

/// Abstract interface for raw blob storage.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`PromptStore`](super::PromptStore) handles the "what" (collection
/// semantics, migration, backup). Only two keys are ever used, both supplied
/// by [`StashConfig`](crate::config::StashConfig).
pub trait StorageBackend {
    /// Read the blob stored under `key`.
    /// Returns `Ok(None)` if nothing has been stored yet.
    /// Returns `Err` only on actual I/O errors (permissions, disk failure).
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a blob under `key`, replacing any previous value.
    /// MUST be atomic where the medium allows it (write to tmp then rename),
    /// and MUST fail rather than write partially on quota exhaustion.
    fn set(&self, key: &str, bytes: &[u8]) -> Result<()>;
}
