//! # Domain Model: Prompts, Notes, and Metadata
//!
//! This module defines the core data structures: [`Prompt`], [`Note`],
//! [`Metadata`], and [`TokenEstimate`].
//!
//! ## Wire Format
//!
//! The persisted blob and the export document share one JSON shape, so every
//! type here serializes with camelCase field names (`createdAt`, `isFavorite`,
//! `tokenEstimate`). Changing a field name is a storage format change.
//!
//! ## Legacy Tolerance
//!
//! Older blobs predate ratings, favorites, notes, and metadata. Deserialization
//! must accept them: `rating`, `isFavorite`, and `notes` fall back to their
//! zero values via `#[serde(default)]`, and `metadata` falls back to `None`.
//! Synthesizing metadata for such records is the store's job
//! (see `PromptStore::list`), because it can fail and needs logging.
//!
//! ## Identifiers
//!
//! Prompt and note ids are epoch-milliseconds taken at creation: opaque to
//! callers, but monotonic enough to sort by creation order. The store bumps a
//! candidate id past any collision, so ids stay unique even for
//! same-millisecond creations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a note, in characters.
pub const NOTE_MAX_CHARS: usize = 500;

/// Maximum length of a model name, in characters.
pub const MODEL_NAME_MAX_CHARS: usize = 100;

/// Confidence level of a token estimate, derived from the range midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Estimated token range for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEstimate {
    pub min: u64,
    pub max: u64,
    pub confidence: Confidence,
}

/// Derived metadata for a prompt: which model it targets, when it was
/// stamped, and the token estimate for its content.
///
/// Invariant: `updated_at` never precedes `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token_estimate: TokenEstimate,
}

/// A free-form note attached to a prompt. Owned exclusively by its parent;
/// removed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(id: u64, content: String) -> Self {
        Self {
            id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// A stored prompt entry.
///
/// `created_at` is `None` only for legacy blobs that predate the field;
/// `metadata` is `None` only when read-time migration could not synthesize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl Prompt {
    pub fn new(id: u64, title: String, content: String, metadata: Metadata) -> Self {
        Self {
            id,
            title,
            content,
            created_at: Some(Utc::now()),
            rating: 0,
            is_favorite: false,
            notes: Vec::new(),
            metadata: Some(metadata),
        }
    }

    /// The timestamp used for ordering: metadata creation time if present,
    /// else the record's own, else the epoch.
    pub fn effective_created_at(&self) -> DateTime<Utc> {
        self.metadata
            .as_ref()
            .map(|m| m.created_at)
            .or(self.created_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
