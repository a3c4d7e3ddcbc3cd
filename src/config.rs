//! # Configuration
//!
//! The store addresses exactly two slots in its backend: the live collection
//! and the single backup slot. Embedding hosts that share one backend between
//! several libraries can remap the keys; everything else uses the compiled
//! defaults. Managed by [`confique`] so hosts can also load overrides from a
//! TOML file if they want to.

use confique::Config;
use serde::{Deserialize, Serialize};

/// Storage-key configuration for a [`PromptStore`](crate::store::PromptStore).
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StashConfig {
    /// Key the live prompt collection is persisted under.
    #[config(default = "prompts")]
    pub storage_key: String,

    /// Key the single backup slot is persisted under. Overwritten on every
    /// import attempt, never accumulated.
    #[config(default = "prompts_backup")]
    pub backup_key: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            storage_key: "prompts".to_string(),
            backup_key: "prompts_backup".to_string(),
        }
    }
}
