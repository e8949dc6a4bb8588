//! Implementation of the `promptly prompts` subcommands.

use super::App;
use crate::cli::{
    ConfigureArgs, CreateArgs, DetectArgs, EditArgs, ListArgs, PromptsAction, ShowArgs,
};
use promptly::context::AppContext;
use promptly::error::{PromptlyError, Result};
use promptly::events::{Event, EventAction};
use promptly::identity::Profile;
use promptly::library::{PromptFilter, TemplateUpdate};
use promptly::template::{Template, TemplateDraft, VariablePatch, detect_variables};
use serde_json::json;

pub async fn dispatch(ctx: AppContext, action: PromptsAction) -> Result<()> {
    match action {
        PromptsAction::List(args) => with_app!(ctx, app => cmd_list(&app, args)),
        PromptsAction::Show(args) => with_app!(ctx, app => cmd_show(&app, args)),
        PromptsAction::Create(args) => with_app!(ctx, app => cmd_create(&mut app, args)),
        PromptsAction::Edit(args) => with_app!(ctx, app => cmd_edit(&mut app, args)),
        PromptsAction::Configure(args) => with_app!(ctx, app => cmd_configure(&mut app, args)),
        PromptsAction::Delete(args) => with_app!(ctx, app => cmd_delete(&mut app, args)),
        PromptsAction::Detect(args) => cmd_detect(args),
    }
}

fn cmd_list(app: &App, args: ListArgs) -> Result<()> {
    let filter = PromptFilter {
        text: args.search,
        category: args.category,
        mine: args.mine,
    };
    let templates = app.library.list(app.user_id(), &filter)?;

    if templates.is_empty() {
        println!("No prompts found.");
        return Ok(());
    }

    println!("{:<40} {:<14} {:>6}  TITLE", "ID", "CATEGORY", "USES");
    for template in &templates {
        let marker = if !template.is_public { " [private]" } else { "" };
        println!(
            "{:<40} {:<14} {:>6}  {}{}",
            template.id,
            truncate(&template.category, 14),
            template.usage_count,
            template.title,
            marker
        );
    }
    println!();
    println!("{} prompt(s)", templates.len());
    Ok(())
}

fn cmd_show(app: &App, args: ShowArgs) -> Result<()> {
    let template = app.library.get(&args.prompt_id, app.user_id())?;
    print_template(&template);
    Ok(())
}

fn cmd_create(app: &mut App, args: CreateArgs) -> Result<()> {
    let draft = TemplateDraft {
        title: args.title,
        description: args.description,
        content: args.content,
        profession: args.profession,
        category: args.category,
        tone: args.tone,
        is_public: args.public,
    };
    let template = app.library.create(app.session.profile(), draft)?;

    app.record(
        Event::new(EventAction::PromptCreate, app.user_id())
            .with_prompt(&template.id)
            .with_details(json!({
                "public": template.is_public,
                "variables": template.variables.len(),
            })),
    );

    println!("Created prompt '{}'.", template.id);
    if args.public != template.is_public {
        println!("Free accounts share their prompts with the community; upgrade to keep them private.");
    }
    println!();
    print_template(&template);
    Ok(())
}

fn cmd_edit(app: &mut App, args: EditArgs) -> Result<()> {
    let owner = require_profile(app)?.clone();
    let update = TemplateUpdate {
        title: args.title,
        description: args.description,
        content: args.content,
        profession: args.profession,
        category: args.category,
        tone: args.tone,
        is_public: args.public,
    };
    let template = app.library.update(&args.prompt_id, &owner, update)?;
    app.record(Event::new(EventAction::PromptUpdate, Some(owner.id.as_str())).with_prompt(&template.id));

    println!("Updated prompt '{}'.", template.id);
    println!();
    print_template(&template);
    Ok(())
}

fn cmd_configure(app: &mut App, args: ConfigureArgs) -> Result<()> {
    let owner_id = require_profile(app)?.id.clone();
    let patch = VariablePatch {
        example: args.example,
        default_value: args.default_value,
        required: args.required,
    };
    let template =
        app.library
            .configure_variable(&args.prompt_id, &owner_id, &args.variable, patch)?;
    app.record(
        Event::new(EventAction::PromptUpdate, Some(owner_id.as_str()))
            .with_prompt(&template.id)
            .with_details(json!({ "variable": args.variable })),
    );

    println!("Updated variable '{}' of '{}'.", args.variable, template.id);
    println!();
    print_variables(&template);
    Ok(())
}

fn cmd_delete(app: &mut App, args: ShowArgs) -> Result<()> {
    let owner_id = require_profile(app)?.id.clone();
    app.library.delete(&args.prompt_id, &owner_id)?;
    app.record(Event::new(EventAction::PromptDelete, Some(owner_id.as_str())).with_prompt(&args.prompt_id));

    println!("Deleted prompt '{}'.", args.prompt_id);
    Ok(())
}

/// Execute `promptly prompts detect`: list the variables a text declares.
///
/// Needs no initialized data directory.
pub fn cmd_detect(args: DetectArgs) -> Result<()> {
    let variables = detect_variables(&args.text, &[]);
    if variables.is_empty() {
        println!("No variables found. Use {{{{name}}}} to declare one.");
        return Ok(());
    }
    for variable in &variables {
        println!("{}", variable.name);
    }
    Ok(())
}

fn require_profile(app: &App) -> Result<&Profile> {
    app.session.profile().ok_or_else(|| {
        PromptlyError::AuthRequired(
            "run `promptly onboard` or `promptly signin` to manage prompts".to_string(),
        )
    })
}

fn print_template(template: &Template) {
    println!("{}", template.title);
    println!("{}", "=".repeat(template.title.chars().count()));
    println!();
    println!("  id:         {}", template.id);
    if !template.description.is_empty() {
        println!("  about:      {}", template.description);
    }
    if !template.category.is_empty() {
        println!("  category:   {}", template.category);
    }
    if !template.profession.is_empty() {
        println!("  profession: {}", template.profession);
    }
    if !template.tone.is_empty() {
        println!("  tone:       {}", template.tone);
    }
    if let Some(author) = &template.author {
        println!("  author:     {}", author);
    }
    println!(
        "  visibility: {}",
        if template.is_public { "public" } else { "private" }
    );
    println!("  uses:       {}", template.usage_count);
    println!();
    println!("{}", template.content);
    println!();
    print_variables(template);
}

fn print_variables(template: &Template) {
    if template.variables.is_empty() {
        println!("No variables.");
        return;
    }
    println!("Variables:");
    for variable in &template.variables {
        let mut notes = Vec::new();
        if variable.required {
            notes.push("required".to_string());
        }
        if !variable.example.is_empty() {
            notes.push(format!("example: {}", variable.example));
        }
        if !variable.default_value.is_empty() {
            notes.push(format!("default: {}", variable.default_value));
        }
        if notes.is_empty() {
            println!("  {}", variable.name);
        } else {
            println!("  {} ({})", variable.name, notes.join("; "));
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Legal", 14), "Legal");
        assert_eq!(truncate("Human Resources", 6), "Human…");
        assert_eq!(truncate("", 3), "");
    }
}
