//! Navigation commands: `status`, `navigate` and `select`.

use super::App;
use super::account::usage_line;
use crate::cli::{NavigateArgs, SelectArgs};
use promptly::error::{PromptlyError, Result};
use promptly::events::{Event, EventAction, read_events};
use promptly::library::PromptFilter;
use promptly::session::{AuthMode, NavOutcome, View};
use serde_json::json;

/// Execute the `promptly status` command.
pub fn cmd_status(app: &App) -> Result<()> {
    let session = app.session.session();

    println!("Promptly Status");
    println!("===============");
    println!();

    println!("Session:");
    match session.profile() {
        Some(profile) => {
            println!("  {:10} {}", "kind", session.kind());
            println!("  {:10} {} ({})", "user", profile.name, profile.id);
            println!("  {:10} {}", "prompts", usage_line(profile));
        }
        None => println!("  {:10} {}", "kind", "guest"),
    }
    println!();

    println!("Navigation:");
    let view = match app.session.view() {
        View::Loading => "loading".to_string(),
        View::Onboarding => "onboarding".to_string(),
        View::Screen(screen) => screen.to_string(),
    };
    println!("  {:10} {}", "screen", app.session.current_screen());
    println!("  {:10} {}", "view", view);
    if let Some(template) = app.session.selected_template() {
        println!("  {:10} {} ({})", "selected", template.title, template.id);
    }
    if let Some(prompt) = app.session.auth_prompt() {
        let mode = match prompt.mode {
            AuthMode::SignIn => "sign in",
            AuthMode::SignUp => "sign up",
        };
        println!("  {:10} {} pending", "auth", mode);
    }
    println!();

    let visible = app.library.list(app.user_id(), &PromptFilter::default())?;
    let categories = app.library.categories(app.user_id())?;
    let events = match read_events(&app.ctx.events_path) {
        Ok(events) => events.len().to_string(),
        Err(_) => "unreadable".to_string(),
    };
    let generation = match &app.config.generation.endpoint {
        Some(endpoint) => endpoint.as_str(),
        None => "offline (built-in responses)",
    };
    let identity = if app.config.identity.is_demo() {
        "demo (device-local accounts)"
    } else {
        "remote"
    };

    println!("Environment:");
    println!("  {:10} {}", "data dir", app.ctx.data_dir.display());
    println!("  {:10} {} visible", "prompts", visible.len());
    if !categories.is_empty() {
        println!("  {:10} {}", "categories", categories.join(", "));
    }
    println!("  {:10} {}", "generation", generation);
    println!("  {:10} {}", "identity", identity);
    println!("  {:10} {}", "events", events);

    Ok(())
}

/// Execute the `promptly navigate` command.
///
/// A guest asking for a protected screen gets a sign-up prompt and an
/// auth-required error.
pub fn cmd_navigate(app: &mut App, args: NavigateArgs) -> Result<()> {
    match app.session.navigate(args.screen) {
        NavOutcome::Navigated(screen) => {
            app.record(
                Event::new(EventAction::Navigate, app.user_id())
                    .with_details(json!({ "screen": screen.as_str() })),
            );
            println!("Now on {}.", screen);
            Ok(())
        }
        NavOutcome::AuthPromptOpened => Err(auth_required(args.screen.as_str())),
    }
}

/// Execute the `promptly select` command.
pub fn cmd_select(app: &mut App, args: SelectArgs) -> Result<()> {
    let template = app.library.get(&args.prompt_id, app.user_id())?;
    let title = template.title.clone();
    match app.session.select_prompt(template) {
        NavOutcome::Navigated(_) => {
            println!("Selected '{}' ({}).", title, args.prompt_id);
            println!("Preview it with `promptly preview` or run it with `promptly run`.");
            Ok(())
        }
        NavOutcome::AuthPromptOpened => Err(auth_required("execute-prompt")),
    }
}

pub(super) fn auth_required(screen: &str) -> PromptlyError {
    PromptlyError::AuthRequired(format!(
        "'{}' needs a user; run `promptly onboard` or `promptly signup` first",
        screen
    ))
}
