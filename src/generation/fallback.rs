//! Deterministic fallback responses.
//!
//! Used when no generation endpoint is configured, or when the endpoint
//! fails and fallback is enabled. The same request always yields the same
//! text.

use super::{GenerationRequest, GenerationSource, Generated, TextGenerator};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

const FALLBACK_MODEL: &str = "promptly-fallback";

/// Canned generator with an optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct FallbackGenerator {
    delay: Duration,
}

impl FallbackGenerator {
    pub fn with_delay_ms(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Build the response text without any delay.
    pub fn respond(&self, request: &GenerationRequest) -> String {
        match &request.flow_title {
            Some(title) => flow_response(title, &request.message),
            None => chat_response(&request.message),
        }
    }
}

fn flow_response(title: &str, message: &str) -> String {
    format!(
        "✨ **{title}** - Simulated response\n\n\
         Your request \"{message}\" was processed successfully.\n\n\
         **Generated result:**\n\n\
         This is a simulated response for demonstration. With a generation \
         service configured, this text would be written by the assistant for \
         your profession and needs.\n\n\
         **Available features:**\n\
         • Professional content generation\n\
         • Adaptation to your business context\n\
         • Customizable variables\n\
         • Export and save\n\n\
         ✅ **Actions:** Copy, Export PDF, Save"
    )
}

fn chat_response(message: &str) -> String {
    let responses = [
        format!(
            "I understand your request about \"{message}\".\n\n\
             🎯 **Analysis:**\nFor this task I recommend one of the specialized prompts \
             in your library to get an optimized result.\n\n\
             🚀 **Suggestion:**\nSelect a prompt or describe your need in more detail so \
             I can point you to the best solution."
        ),
        format!(
            "Great question! For \"{message}\", here is my analysis:\n\n\
             💡 **Available solutions:**\n\
             • A specialized prompt from your professional library\n\
             • Creating a new custom prompt\n\
             • Adapting an existing template\n\n\
             🎨 **Recommendation:**\nI can help you structure your request to get the \
             best possible result.\n\nWhich approach do you prefer?"
        ),
        format!(
            "Perfect! I'm working on your request \"{message}\".\n\n\
             📋 **Suggested content:**\nBased on your request, I can offer several \
             approaches suited to your professional context.\n\n\
             ✨ **Optimizations:**\n\
             • Professional tone\n\
             • Clear and effective structure\n\
             • Personalized to your needs\n\n\
             Would you like me to develop a specific solution?"
        ),
    ];

    let index = stable_index(message, responses.len());
    responses[index].clone()
}

/// FNV-1a over the message bytes, reduced to `len`.
fn stable_index(message: &str, len: usize) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in message.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % len as u64) as usize
}

#[async_trait]
impl TextGenerator for FallbackGenerator {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Generated {
            text: self.respond(request),
            model: Some(FALLBACK_MODEL.to_string()),
            source: GenerationSource::Fallback,
        })
    }
}
