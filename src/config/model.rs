//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for promptly.
///
/// This struct represents the contents of `<data_dir>/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Account settings
    // =========================================================================
    /// Prompt executions allowed for a free-tier profile.
    #[serde(default = "default_free_prompt_limit")]
    pub free_prompt_limit: u32,

    /// Minimum password length accepted at sign-up.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    // =========================================================================
    // Logging
    // =========================================================================
    /// tracing filter directive used when `RUST_LOG` is unset (e.g. "info").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,

    /// Whether to append activity events to `events.ndjson`.
    #[serde(default = "default_true")]
    pub events_enabled: bool,

    // =========================================================================
    // Collaborators
    // =========================================================================
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            free_prompt_limit: default_free_prompt_limit(),
            min_password_length: default_min_password_length(),
            log_filter: None,
            events_enabled: default_true(),
            generation: GenerationConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}
