//! Implementation of the `promptly init` command.
//!
//! Creates the data directory, writes a default `config.yaml` and seeds the
//! prompt library with the starter prompts. Running it again is harmless:
//! an existing config is kept unless `--force` is given, and seeding only
//! happens when the library is empty.

use crate::cli::InitArgs;
use promptly::config::Config;
use promptly::context::AppContext;
use promptly::error::{PromptlyError, Result};
use promptly::events::{Event, EventAction, append_event};
use promptly::fs::atomic_write_file;
use promptly::library::PromptLibrary;
use serde_json::json;
use std::fs;
use tracing::warn;

/// Execute the `promptly init` command.
pub fn cmd_init(ctx: &AppContext, args: InitArgs) -> Result<()> {
    fs::create_dir_all(&ctx.data_dir).map_err(|e| {
        PromptlyError::StorageError(format!(
            "failed to create '{}': {}",
            ctx.data_dir.display(),
            e
        ))
    })?;

    let wrote_config = if args.force || !ctx.config_path.exists() {
        atomic_write_file(&ctx.config_path, &Config::default().to_yaml()?)?;
        true
    } else {
        false
    };

    // Existing config decides whether events are recorded.
    let config = Config::load_or_default(&ctx.config_path)?;

    let library = PromptLibrary::open(&ctx.prompts_dir)?;
    let seeded = library.seed()?;

    if config.events_enabled {
        let event = Event::new(EventAction::Init, None)
            .with_details(json!({ "seeded": seeded, "config_written": wrote_config }));
        if let Err(err) = append_event(&ctx.events_path, &event) {
            warn!(error = %err, "failed to record init event");
        }
    }

    println!("Initialized promptly in {}", ctx.data_dir.display());
    println!();
    if wrote_config {
        println!("  config:  {} (written)", ctx.config_path.display());
    } else {
        println!("  config:  {} (kept)", ctx.config_path.display());
    }
    println!("  prompts: {} ({} starter prompts added)", ctx.prompts_dir.display(), seeded);
    println!();
    println!("Get started with `promptly onboard --name <name> --profession <profession>`.");

    Ok(())
}
