//! Configuration sections and defaults for promptly.

use serde::{Deserialize, Serialize};

/// Placeholder backend URL shipped in sample configs; selects demo mode.
pub const DEMO_URL: &str = "https://demo.supabase.co";

/// Placeholder backend key shipped in sample configs; selects demo mode.
pub const DEMO_ANON_KEY: &str = "demo-anon-key";

/// Text generation service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Endpoint URL. When unset, every request uses the fallback generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Bearer token sent to the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// HTTP timeout for a single generation call.
    pub timeout_secs: u64,

    /// Answer with the fallback generator when the endpoint fails.
    pub fallback_on_error: bool,

    /// Simulated latency of the fallback generator.
    pub fallback_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            fallback_on_error: true,
            fallback_delay_ms: 0,
        }
    }
}

/// Identity/profile backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Backend base URL (e.g. `https://xyz.supabase.co`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Public (anon) API key for the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

impl IdentityConfig {
    /// True when no usable backend is configured and the offline demo
    /// identity store should be used instead.
    pub fn is_demo(&self) -> bool {
        match (self.url.as_deref(), self.anon_key.as_deref()) {
            (Some(url), Some(key)) => {
                url.trim().is_empty() || key.trim().is_empty() || url == DEMO_URL || key == DEMO_ANON_KEY
            }
            _ => true,
        }
    }
}

pub(crate) fn default_free_prompt_limit() -> u32 {
    10
}
pub(crate) fn default_min_password_length() -> usize {
    6
}
pub(crate) fn default_timeout_secs() -> u64 {
    60
}
pub(crate) fn default_true() -> bool {
    true
}
