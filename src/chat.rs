//! Chat with the assistant, optionally bound to a prompt.

use crate::error::{PromptlyError, Result};
use crate::generation::{GenerationRequest, GenerationSource, TextGenerator};
use crate::identity::Profile;
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Prompt the message was sent with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<GenerationSource>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            template_id: None,
            source: None,
            created_at: Utc::now(),
        }
    }
}

/// An ordered exchange of user and assistant messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bound: Option<Template>,
}

impl Conversation {
    /// A conversation opened by a greeting addressed to `profile`.
    pub fn start(profile: &Profile) -> Self {
        let first_name = profile.name.split_whitespace().next().unwrap_or("there");
        let greeting = if profile.profession.trim().is_empty() {
            format!("Hello {}! How can I help you today?", first_name)
        } else {
            format!(
                "Hello {}! I'm your Promptly assistant for {} work. \
                 Pick a prompt or just describe what you need.",
                first_name, profile.profession
            )
        };
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, greeting)],
            bound: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn bound_template(&self) -> Option<&Template> {
        self.bound.as_ref()
    }

    /// Send later messages with `template` as context, or unbind with `None`.
    pub fn bind(&mut self, template: Option<Template>) {
        self.bound = template;
    }

    /// Send `text` and append the assistant's answer.
    ///
    /// On failure the user message is still recorded; the caller may send
    /// again.
    pub async fn send(
        &mut self,
        text: &str,
        generator: &dyn TextGenerator,
        user_id: Option<&str>,
    ) -> Result<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PromptlyError::ValidationError("message is empty".to_string()));
        }

        let mut message = ChatMessage::new(Role::User, text);
        let mut request = GenerationRequest::new(text).with_user(user_id.map(str::to_string));
        if let Some(template) = &self.bound {
            message.template_id = Some(template.id.clone());
            request = request.with_flow(template.id.clone(), template.title.clone());
        }
        let template_id = message.template_id.clone();
        self.messages.push(message);

        let generated = generator.generate(&request).await?;
        debug!(source = ?generated.source, template = ?template_id, "chat reply");

        let mut reply = ChatMessage::new(Role::Assistant, generated.text);
        reply.template_id = template_id;
        reply.source = Some(generated.source);
        self.messages.push(reply);
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
