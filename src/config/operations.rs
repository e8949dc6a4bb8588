//! Config loading, environment overrides, and validation.

use super::model::Config;
use crate::error::{PromptlyError, Result};
use std::path::Path;

/// Environment variables that override config file values.
pub const ENV_GENERATION_ENDPOINT: &str = "PROMPTLY_GENERATION_ENDPOINT";
pub const ENV_GENERATION_API_KEY: &str = "PROMPTLY_GENERATION_API_KEY";
pub const ENV_IDENTITY_URL: &str = "PROMPTLY_IDENTITY_URL";
pub const ENV_IDENTITY_KEY: &str = "PROMPTLY_IDENTITY_KEY";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            PromptlyError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, or defaults if the file does not exist.
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            PromptlyError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            PromptlyError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Apply `PROMPTLY_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (empty values are ignored).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_GENERATION_ENDPOINT) {
            self.generation.endpoint = Some(endpoint);
        }
        if let Some(key) = get(ENV_GENERATION_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(url) = get(ENV_IDENTITY_URL) {
            self.identity.url = Some(url);
        }
        if let Some(key) = get(ENV_IDENTITY_KEY) {
            self.identity.anon_key = Some(key);
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `free_prompt_limit` must be positive
    /// - `min_password_length` must be positive
    /// - `generation.timeout_secs` must be positive
    /// - `generation.endpoint`, when set, must be an http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.free_prompt_limit == 0 {
            return Err(PromptlyError::ValidationError(
                "config: free_prompt_limit must be greater than 0".to_string(),
            ));
        }

        if self.min_password_length == 0 {
            return Err(PromptlyError::ValidationError(
                "config: min_password_length must be greater than 0".to_string(),
            ));
        }

        if self.generation.timeout_secs == 0 {
            return Err(PromptlyError::ValidationError(
                "config: generation.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(endpoint) = &self.generation.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(PromptlyError::ValidationError(format!(
                "config: generation.endpoint must be an http(s) URL (found '{}')",
                endpoint
            )));
        }

        Ok(())
    }
}
