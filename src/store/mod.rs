//! # Storage Layer
//!
//! The storage abstraction is split in two, the same way the persisted data
//! is:
//!
//! 1. [`StorageBackend`]: raw blob I/O. Knows *how* bytes are kept (memory,
//!    filesystem), addressed by string keys, nothing else.
//! 2. [`PromptStore`]: the business logic. Knows *what* the blobs mean:
//!    the live collection under one key, the single backup slot under another.
//!
//! ## Persistence Model
//!
//! The whole collection is one JSON blob. Every mutation is a full
//! read-modify-write: load the blob, locate the target by id, apply, write the
//! blob back. There is no partial or append-only persistence, and storage
//! order is insertion order (display ordering is a read-time concern, see
//! [`crate::view`]).
//!
//! ## Migration-on-Read
//!
//! Blobs written by older versions lack ratings, favorites, notes, or
//! metadata. `list()` upgrades each record as it is read: scalar fields get
//! their zero values, and a missing metadata block is synthesized from the
//! record's content with its timestamps pinned to the record's original
//! creation time. Synthesis is best-effort: a failure is logged and leaves the
//! record metadata-less rather than failing the whole load.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one file per key, atomic tmp+rename writes.
//! - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O,
//!   with write-error simulation.

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod prompt_store;

pub use backend::StorageBackend;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use prompt_store::PromptStore;
