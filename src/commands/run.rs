//! Prompt execution commands: `preview` and `run`.

use super::App;
use super::navigation::auth_required;
use crate::cli::RunArgs;
use promptly::error::{PromptlyError, Result};
use promptly::events::{Event, EventAction};
use promptly::generation::GenerationSource;
use promptly::session::NavOutcome;
use promptly::template::{
    Template, VariableValues, execute, missing_required, prefill_defaults, render_preview,
    validate_values,
};
use serde_json::json;
use tracing::warn;

/// Execute the `promptly preview` command: render without generating.
pub fn cmd_preview(app: &App, args: RunArgs) -> Result<()> {
    let template = resolve_template(app, args.prompt_id.as_deref())?;
    let values = collect_values(&template, args.vars);
    validate_values(&template, &values)?;

    println!("{}", render_preview(&template, &values));

    let missing = missing_required(&template, &values);
    if !missing.is_empty() {
        println!();
        println!("Missing before it can run: {}", missing.join(", "));
        println!(
            "Supply them with `--var {}=<value>`.",
            missing.first().map(String::as_str).unwrap_or("name")
        );
    }
    Ok(())
}

/// Execute the `promptly run` command.
///
/// A guest naming a prompt gets the sign-up prompt. The current user must
/// have quota left. On success the run is counted
/// against the user and the prompt's usage counter is bumped; failures of
/// either are logged and do not fail the run.
pub async fn cmd_run(app: &mut App, args: RunArgs) -> Result<()> {
    let template = resolve_template(app, args.prompt_id.as_deref())?;
    // Selecting as a guest opens the sign-up prompt, like `select`.
    if args.prompt_id.is_some()
        && app.session.select_prompt(template.clone()) == NavOutcome::AuthPromptOpened
    {
        return Err(auth_required("execute-prompt"));
    }
    app.session.ensure_can_run_prompt()?;

    let values = collect_values(&template, args.vars);
    let generator = app.generator()?;
    let result = execute(&template, &values, &generator, app.user_id()).await?;

    app.session.record_usage().await;
    if let Err(err) = app.library.increment_usage(&template.id) {
        warn!(prompt = %template.id, error = %err, "failed to bump usage count");
    }

    app.record(
        Event::new(EventAction::Execute, app.user_id())
            .with_prompt(&template.id)
            .with_details(json!({
                "source": result.source,
                "elapsed_ms": result.elapsed_ms,
                "variables": result.variables.len(),
            })),
    );

    println!("{}", result.output);
    if result.source == GenerationSource::Fallback {
        eprintln!();
        eprintln!("(generated offline by the built-in assistant)");
    }
    if let Some(remaining) = app.session.profile().and_then(|p| p.remaining()) {
        eprintln!("{} free prompt run(s) left.", remaining);
    }
    Ok(())
}

/// The prompt named on the command line, else the selected prompt.
///
/// A selected prompt is re-read from the library so edits made since the
/// selection are picked up.
fn resolve_template(app: &App, prompt_id: Option<&str>) -> Result<Template> {
    let id = match prompt_id {
        Some(id) => id.to_string(),
        None => match app.session.selected_template() {
            Some(selected) => selected.id.clone(),
            None => {
                return Err(PromptlyError::UserError(
                    "no prompt selected; pass a prompt id or run `promptly select <id>`"
                        .to_string(),
                ));
            }
        },
    };
    app.library.get(&id, app.user_id())
}

/// Defaults first, `--var` pairs on top.
fn collect_values(template: &Template, vars: Vec<(String, String)>) -> VariableValues {
    prefill_defaults(template, vars.into_iter().collect())
}
