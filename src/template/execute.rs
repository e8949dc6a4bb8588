//! Prompt execution: substitute, then hand off to a text generator.

use super::engine::{VariableValues, prepare};
use super::model::Template;
use crate::error::Result;
use crate::generation::{GenerationRequest, GenerationSource, TextGenerator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub id: String,
    pub template_id: String,
    /// The fully substituted prompt sent to the generator.
    pub prompt_text: String,
    /// Resolved value of every declared variable.
    pub variables: VariableValues,
    /// Text returned by the generator.
    pub output: String,
    pub model: Option<String>,
    pub source: GenerationSource,
    pub elapsed_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Execute `template` with `values` through `generator`.
///
/// Values are validated against the declared variable set and every required
/// variable must have a non-blank value; otherwise a validation error is
/// returned and the generator is never called. A generator failure is
/// returned as-is; nothing is retried.
pub async fn execute(
    template: &Template,
    values: &VariableValues,
    generator: &dyn TextGenerator,
    user_id: Option<&str>,
) -> Result<ExecutionResult> {
    let (prompt_text, resolved) = prepare(template, values)?;
    debug!(
        template = %template.id,
        generator = generator.name(),
        chars = prompt_text.len(),
        "executing prompt"
    );

    let request = GenerationRequest::new(prompt_text.clone())
        .with_flow(template.id.clone(), template.title.clone())
        .with_variables(resolved.clone())
        .with_user(user_id.map(str::to_string));

    let start = Instant::now();
    let generated = generator.generate(&request).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        template = %template.id,
        source = ?generated.source,
        elapsed_ms,
        "prompt executed"
    );

    Ok(ExecutionResult {
        id: uuid::Uuid::new_v4().to_string(),
        template_id: template.id.clone(),
        prompt_text,
        variables: resolved,
        output: generated.text,
        model: generated.model,
        source: generated.source,
        elapsed_ms,
        created_at: Utc::now(),
    })
}
