//! Activity log for promptly.
//!
//! Events are appended in NDJSON format (one JSON object per line) to
//! `<data_dir>/events.ndjson`.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (sign_in, execute, chat, ...)
//! - `actor`: the user id, or `anonymous`
//! - `prompt`: optional prompt id
//! - `details`: freeform object with action-specific details
//!
//! ```no_run
//! use promptly::context::AppContext;
//! use promptly::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let ctx = AppContext::resolve(None)?;
//! let event = Event::new(EventAction::Execute, Some("temp-user-1"))
//!     .with_prompt("sales-pitch")
//!     .with_details(json!({"source": "fallback"}));
//! append_event(&ctx.events_path, &event)?;
//! # Ok::<(), promptly::error::PromptlyError>(())
//! ```

use crate::error::{PromptlyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Actor recorded when no user is active.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Init,
    Onboard,
    SignUp,
    SignIn,
    SignOut,
    Upgrade,
    Navigate,
    PromptCreate,
    PromptUpdate,
    PromptDelete,
    Execute,
    Chat,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventAction::Init => "init",
            EventAction::Onboard => "onboard",
            EventAction::SignUp => "sign_up",
            EventAction::SignIn => "sign_in",
            EventAction::SignOut => "sign_out",
            EventAction::Upgrade => "upgrade",
            EventAction::Navigate => "navigate",
            EventAction::PromptCreate => "prompt_create",
            EventAction::PromptUpdate => "prompt_update",
            EventAction::PromptDelete => "prompt_delete",
            EventAction::Execute => "execute",
            EventAction::Chat => "chat",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub details: Value,
}

impl Event {
    /// A new event stamped now, attributed to `user_id` or [`ANONYMOUS`].
    pub fn new(action: EventAction, user_id: Option<&str>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: user_id.unwrap_or(ANONYMOUS).to_string(),
            prompt: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_prompt(mut self, prompt_id: impl Into<String>) -> Self {
        self.prompt = Some(prompt_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            PromptlyError::StorageError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Append one event as a JSON line, creating the file if needed.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        PromptlyError::StorageError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event in the log. A missing file is an empty log; malformed
/// lines are skipped.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| {
        PromptlyError::StorageError(format!(
            "failed to read events file '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
