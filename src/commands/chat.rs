//! Implementation of the `promptly chat` command.
//!
//! The conversation is kept in device storage between invocations, so each
//! call appends one exchange.

use super::App;
use super::navigation::auth_required;
use crate::cli::ChatArgs;
use promptly::chat::{Conversation, Role};
use promptly::error::Result;
use promptly::events::{Event, EventAction};
use promptly::persistence::{get_json, keys, set_json};
use promptly::session::{NavOutcome, Screen};
use serde_json::json;
use tracing::warn;

/// Execute the `promptly chat` command.
pub async fn cmd_chat(app: &mut App, args: ChatArgs) -> Result<()> {
    if app.session.navigate(Screen::Chat) == NavOutcome::AuthPromptOpened {
        return Err(auth_required(Screen::Chat.as_str()));
    }
    let profile = app
        .session
        .profile()
        .cloned()
        .ok_or_else(|| auth_required(Screen::Chat.as_str()))?;

    let mut conversation = if args.reset {
        Conversation::start(&profile)
    } else {
        load_conversation(app).unwrap_or_else(|| Conversation::start(&profile))
    };

    if args.unbind {
        conversation.bind(None);
        println!("Chatting without a prompt.");
    }
    if let Some(prompt_id) = &args.prompt {
        let template = app.library.get(prompt_id, Some(profile.id.as_str()))?;
        println!("Chatting with '{}' as context.", template.title);
        conversation.bind(Some(template));
    }

    let Some(message) = args.message else {
        set_json(&*app.device, keys::CHAT, &conversation)?;
        print_transcript(&conversation);
        return Ok(());
    };

    let generator = app.generator()?;
    let sent = conversation
        .send(&message, &generator, Some(profile.id.as_str()))
        .await
        .map(|reply| (reply.content.clone(), reply.template_id.clone()));
    // The user message is kept even when the reply failed.
    set_json(&*app.device, keys::CHAT, &conversation)?;
    let (reply, template_id) = sent?;

    let mut event = Event::new(EventAction::Chat, Some(profile.id.as_str()))
        .with_details(json!({ "messages": conversation.messages().len() }));
    if let Some(id) = template_id {
        event = event.with_prompt(id);
    }
    app.record(event);

    println!("{}", reply);
    Ok(())
}

/// The stored conversation. An unreadable one is dropped with a warning.
fn load_conversation(app: &App) -> Option<Conversation> {
    match get_json::<Conversation>(&*app.device, keys::CHAT) {
        Ok(conversation) => conversation,
        Err(err) => {
            warn!(error = %err, "discarding unreadable conversation");
            None
        }
    }
}

fn print_transcript(conversation: &Conversation) {
    if let Some(template) = conversation.bound_template() {
        println!("[context: {}]", template.title);
        println!();
    }
    for message in conversation.messages() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "promptly",
        };
        println!("{:>9}: {}", who, message.content);
    }
    if conversation.messages().is_empty() {
        println!("No messages yet. Send one with `promptly chat \"<message>\"`.");
    }
}
