use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::backend::StorageBackend;
use crate::error::{Result, StashError};

/// Filesystem storage backend: one `{key}.json` file per key under a root
/// directory.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(StashError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(StashError::Io)?;
        Ok(Some(bytes))
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_root()?;

        let target = self.blob_path(key);

        // Atomic write: tmp file then rename
        let tmp = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp, bytes).map_err(StashError::Io)?;
        fs::rename(&tmp, target).map_err(StashError::Io)?;

        Ok(())
    }
}
