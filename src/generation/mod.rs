//! Text generation for prompt execution and chat.
//!
//! - **TextGenerator**: the collaborator interface (one request, one answer)
//! - **HttpGenerator**: client for a hosted generation endpoint
//! - **FallbackGenerator**: deterministic canned responses
//! - **GenerationService**: primary generator with fallback substitution
//!
//! Calls are single-shot: there is no retry and no cancellation. A failed
//! call is reported to the caller, who may issue a fresh one.

mod fallback;
mod http;

use crate::config::GenerationConfig;
use crate::error::{PromptlyError, Result};
use crate::template::VariableValues;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub use fallback::FallbackGenerator;
pub use http::HttpGenerator;

/// Where a generated text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    /// The configured generation service.
    Service,
    /// The built-in fallback generator.
    Fallback,
}

/// Input handed to a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Fully substituted prompt text, or the chat message.
    pub message: String,

    /// Id of the prompt being executed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,

    /// Title of the prompt being executed, if any.
    #[serde(skip)]
    pub flow_title: Option<String>,

    /// Resolved variable values used to build `message`.
    #[serde(skip_serializing_if = "VariableValues::is_empty")]
    pub variables: VariableValues,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_flow(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.flow_id = Some(id.into());
        self.flow_title = Some(title.into());
        self
    }

    pub fn with_variables(mut self, variables: VariableValues) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// A generator's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub model: Option<String>,
    pub source: GenerationSource,
}

/// Text generation collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generator name for logging.
    fn name(&self) -> &'static str;

    /// Produce text for `request`. Resolves exactly once.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
        self.as_ref().generate(request).await
    }
}

/// Primary generator with a deterministic fallback.
///
/// Without a primary generator every request is answered by the fallback.
/// With one, primary failures fall back only when `fallback_on_error` is set;
/// otherwise they are returned to the caller.
pub struct GenerationService {
    primary: Option<Box<dyn TextGenerator>>,
    fallback: FallbackGenerator,
    fallback_on_error: bool,
}

impl GenerationService {
    pub fn new(
        primary: Option<Box<dyn TextGenerator>>,
        fallback: FallbackGenerator,
        fallback_on_error: bool,
    ) -> Self {
        Self {
            primary,
            fallback,
            fallback_on_error,
        }
    }

    /// Fallback only, no external service.
    pub fn offline() -> Self {
        Self::new(None, FallbackGenerator::default(), true)
    }

    /// Build from configuration: an HTTP generator when an endpoint is set.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let primary: Option<Box<dyn TextGenerator>> = match &config.endpoint {
            Some(endpoint) => Some(Box::new(HttpGenerator::new(
                endpoint.clone(),
                config.api_key.clone(),
                config.timeout_secs,
            )?)),
            None => None,
        };
        let fallback = FallbackGenerator::with_delay_ms(config.fallback_delay_ms);
        Ok(Self::new(primary, fallback, config.fallback_on_error))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }
}

#[async_trait]
impl TextGenerator for GenerationService {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
        let Some(primary) = &self.primary else {
            debug!("no generation endpoint configured, using fallback");
            return self.fallback.generate(request).await;
        };

        match primary.generate(request).await {
            Ok(generated) => Ok(generated),
            Err(err) if self.fallback_on_error => {
                warn!(generator = primary.name(), error = %err, "generation failed, using fallback");
                self.fallback.generate(request).await
            }
            Err(err) => Err(match err {
                PromptlyError::GenerationError(_) => err,
                other => PromptlyError::GenerationError(other.to_string()),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Generator returning scripted answers, recording every request.
    pub(crate) struct ScriptedGenerator {
        pub(crate) reply: std::result::Result<String, String>,
        pub(crate) requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn seen(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(Generated {
                    text: text.clone(),
                    model: Some("scripted-1".to_string()),
                    source: GenerationSource::Service,
                }),
                Err(message) => Err(PromptlyError::GenerationError(message.clone())),
            }
        }
    }
}
