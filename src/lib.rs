//! # promptstash
//!
//! The data layer of a personal prompt library: a collection of prompts with
//! ratings, favorites, notes, and token-estimate metadata, persisted as JSON
//! blobs under two well-known keys, with a versioned export/import protocol
//! on top.
//!
//! ## Architecture
//!
//! Storage is split into a *how* and a *what*. [`store::StorageBackend`] is
//! the how: a two-method key/value trait over opaque byte blobs, with
//! filesystem and in-memory implementations. [`store::PromptStore`] is the
//! what: collection semantics (create, rate, favorite, annotate) over any
//! backend, one full read-modify-write per mutation.
//!
//! The [`sync`] module layers the export/import protocol on top of the store:
//! versioned documents, integrity validation, statistics, and the
//! backup-and-rollback discipline that keeps a failed import from corrupting
//! the collection.
//!
//! ## Quick start
//!
//! ```
//! use promptstash::store::{MemBackend, PromptStore};
//! use promptstash::view::{view, FilterMode};
//!
//! # fn main() -> promptstash::Result<()> {
//! let mut store = PromptStore::new(MemBackend::new());
//! let prompt = store
//!     .create("Summarizer", "claude-3", "Summarize the following text.", false)?
//!     .ok_or_else(|| promptstash::StashError::Validation("blank input".into()))?;
//!
//! store.set_rating(prompt.id, 5)?;
//! store.toggle_favorite(prompt.id)?;
//!
//! let shown = view(&store.list()?, FilterMode::Favorites);
//! assert_eq!(shown.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod store;
pub mod sync;
pub mod view;

pub use config::StashConfig;
pub use error::{Result, StashError};
pub use model::{Metadata, Note, Prompt, TokenEstimate};
pub use store::{PromptStore, StorageBackend};
