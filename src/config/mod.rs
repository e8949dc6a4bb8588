//! Configuration model for promptly.
//!
//! This module defines the Config struct that represents `<data_dir>/config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, environment overrides for service
//! endpoints and credentials, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{DEMO_ANON_KEY, DEMO_URL, GenerationConfig, IdentityConfig};
