//! Configuration for the sync engine.

use serde::{Deserialize, Serialize};

/// Configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Master switch. When false, every entry point short-circuits with a
    /// disabled outcome and no side effects.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How long cached remote enrolment records stay fresh, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Optional regex matched against usernames; matching accounts are
    /// never synced (internally reserved accounts, service users, ...).
    #[serde(default)]
    pub username_exclusion: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    600
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cache_ttl_secs: default_cache_ttl_secs(),
            username_exclusion: None,
        }
    }
}
