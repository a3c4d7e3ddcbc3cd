use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::backend::StorageBackend;
use crate::config::StashConfig;
use crate::error::{Result, StashError};
use crate::metadata::track_model;
use crate::model::{Note, Prompt, NOTE_MAX_CHARS};

/// Snapshot held in the single backup slot: the collection plus the moment it
/// was taken. Overwritten on every import attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub timestamp: DateTime<Utc>,
    pub prompts: Vec<Prompt>,
}

/// The prompt collection over a [`StorageBackend`].
///
/// Every mutation is a full read-modify-write of the live blob. Mutators are
/// fire-and-forget for the caller: a missing target id is a silent no-op,
/// never an error. Only storage failures propagate.
pub struct PromptStore<B: StorageBackend> {
    backend: B,
    config: StashConfig,
}

impl<B: StorageBackend> PromptStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, StashConfig::default())
    }

    pub fn with_config(backend: B, config: StashConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All prompts in storage order, migrated to the current record shape.
    pub fn list(&self) -> Result<Vec<Prompt>> {
        self.read_collection()
    }

    /// Create a prompt and append it to the collection.
    ///
    /// Blank title, model, or content (after trimming) makes this a silent
    /// no-op returning `None`. Storage order is insertion order; display
    /// ordering happens at read time.
    pub fn create(
        &mut self,
        title: &str,
        model: &str,
        content: &str,
        is_code: bool,
    ) -> Result<Option<Prompt>> {
        let title = title.trim();
        let model = model.trim();
        let content = content.trim();
        if title.is_empty() || model.is_empty() || content.is_empty() {
            return Ok(None);
        }

        let mut prompts = self.read_collection()?;
        let metadata = track_model(model, content, is_code)?;
        let id = allocate_id(|candidate| prompts.iter().any(|p| p.id == candidate));
        let prompt = Prompt::new(id, title.to_string(), content.to_string(), metadata);

        prompts.push(prompt.clone());
        self.write_collection(&prompts)?;
        Ok(Some(prompt))
    }

    /// Remove a prompt (and its notes, which it owns) by id.
    pub fn remove(&mut self, id: u64) -> Result<()> {
        let mut prompts = self.read_collection()?;
        let before = prompts.len();
        prompts.retain(|p| p.id != id);
        if prompts.len() == before {
            return Ok(());
        }
        self.write_collection(&prompts)
    }

    /// Set a prompt's rating. Setting the value it already has clears the
    /// rating back to 0 (toggle-to-clear, matching the star widget gesture).
    /// Values above 5 are silently ignored.
    pub fn set_rating(&mut self, id: u64, value: u8) -> Result<()> {
        if value > 5 {
            return Ok(());
        }
        self.with_prompt(id, |prompt| {
            prompt.rating = if prompt.rating == value { 0 } else { value };
        })
    }

    pub fn toggle_favorite(&mut self, id: u64) -> Result<()> {
        self.with_prompt(id, |prompt| {
            prompt.is_favorite = !prompt.is_favorite;
        })
    }

    /// Append a note to a prompt. Blank content is rejected; content past the
    /// 500-character limit is silently dropped, never truncated.
    pub fn add_note(&mut self, id: u64, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() || content.chars().count() > NOTE_MAX_CHARS {
            return Ok(());
        }
        let content = content.to_string();
        self.with_prompt(id, move |prompt| {
            let note_id = allocate_id(|candidate| prompt.notes.iter().any(|n| n.id == candidate));
            prompt.notes.push(Note::new(note_id, content));
        })
    }

    /// Replace a note's content, with the same rules as [`add_note`](Self::add_note).
    pub fn edit_note(&mut self, id: u64, note_id: u64, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() || content.chars().count() > NOTE_MAX_CHARS {
            return Ok(());
        }
        let content = content.to_string();
        self.with_prompt(id, move |prompt| {
            if let Some(note) = prompt.notes.iter_mut().find(|n| n.id == note_id) {
                note.content = content;
            }
        })
    }

    pub fn remove_note(&mut self, id: u64, note_id: u64) -> Result<()> {
        self.with_prompt(id, |prompt| {
            prompt.notes.retain(|n| n.id != note_id);
        })
    }

    /// Snapshot the current persisted collection into the backup slot,
    /// overwriting any prior backup. Must succeed before an import is allowed
    /// to mutate anything.
    pub fn backup(&mut self) -> Result<()> {
        self.snapshot()
            .map_err(|e| StashError::BackupFailed(e.to_string()))
    }

    /// Replace the live collection with the backup slot's contents verbatim.
    pub fn restore(&mut self) -> Result<()> {
        let Some(bytes) = self.backend.get(&self.config.backup_key)? else {
            return Err(StashError::Store("No backup found".to_string()));
        };
        let backup: BackupRecord =
            serde_json::from_slice(&bytes).map_err(StashError::Serialization)?;
        self.write_collection(&backup.prompts)
    }

    /// Persist `prompts` as the new live collection in one write.
    pub(crate) fn replace_collection(&mut self, prompts: Vec<Prompt>) -> Result<()> {
        self.write_collection(&prompts)
    }

    fn snapshot(&mut self) -> Result<()> {
        let backup = BackupRecord {
            timestamp: Utc::now(),
            prompts: self.read_collection()?,
        };
        let bytes = serde_json::to_vec(&backup).map_err(StashError::Serialization)?;
        self.backend.set(&self.config.backup_key, &bytes)
    }

    fn with_prompt<F>(&mut self, id: u64, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Prompt),
    {
        let mut prompts = self.read_collection()?;
        let Some(prompt) = prompts.iter_mut().find(|p| p.id == id) else {
            // Missing targets are silent no-ops, not errors.
            return Ok(());
        };
        mutate(prompt);
        self.write_collection(&prompts)
    }

    fn read_collection(&self) -> Result<Vec<Prompt>> {
        let Some(bytes) = self.backend.get(&self.config.storage_key)? else {
            return Ok(Vec::new());
        };
        let mut prompts: Vec<Prompt> =
            serde_json::from_slice(&bytes).map_err(StashError::Serialization)?;
        for prompt in &mut prompts {
            migrate(prompt);
        }
        Ok(prompts)
    }

    fn write_collection(&self, prompts: &[Prompt]) -> Result<()> {
        let bytes = serde_json::to_vec(prompts).map_err(StashError::Serialization)?;
        self.backend.set(&self.config.storage_key, &bytes)
    }
}

/// Upgrade a record read from an older blob to the current shape.
///
/// Scalar defaults are handled by serde; the one step that can fail is
/// synthesizing a metadata block for records that predate metadata. That
/// failure is logged and leaves the record metadata-less rather than failing
/// the whole load.
fn migrate(prompt: &mut Prompt) {
    if prompt.metadata.is_some() {
        return;
    }
    match track_model("Unknown Model", &prompt.content, false) {
        Ok(mut metadata) => {
            // Pin the synthesized stamps to the record's original creation
            // time when we have it.
            if let Some(created) = prompt.created_at {
                metadata.created_at = created;
                metadata.updated_at = created;
            }
            prompt.metadata = Some(metadata);
        }
        Err(e) => {
            tracing::warn!(id = prompt.id, error = %e, "could not synthesize metadata for legacy prompt");
        }
    }
}

fn allocate_id<F>(taken: F) -> u64
where
    F: Fn(u64) -> bool,
{
    let mut candidate = Utc::now().timestamp_millis() as u64;
    while taken(candidate) {
        candidate += 1;
    }
    candidate
}
