//! Command implementations for promptly.
//!
//! `dispatch` routes each CLI command to its handler. Handlers that need a
//! session run against an [`App`], which loads config, device state, the
//! session controller and the prompt library, and saves the navigation
//! snapshot afterwards.

/// Load an [`App`] from a context, run `$body` with it bound to `$app`, then
/// save the navigation snapshot.
///
/// Failed transitions leave state untouched, so saving is always safe.
macro_rules! with_app {
    ($ctx:expr, $app:ident => $body:expr) => {{
        #[allow(unused_mut)]
        let mut $app = $crate::commands::App::load($ctx).await?;
        let result = $body;
        let saved = $app.save();
        result.and(saved)
    }};
}

mod account;
mod chat;
mod init;
mod navigation;
mod prompts;
mod run;

use crate::cli::Command;
use promptly::config::Config;
use promptly::context::AppContext;
use promptly::error::Result;
use promptly::events::{Event, append_event};
use promptly::generation::GenerationService;
use promptly::identity;
use promptly::library::PromptLibrary;
use promptly::persistence::FileStore;
use promptly::session::{SessionController, SessionSettings};
use std::sync::Arc;
use tracing::warn;

/// Everything a session-aware command works with.
pub struct App {
    pub ctx: AppContext,
    pub config: Config,
    pub device: Arc<FileStore>,
    pub session: SessionController,
    pub library: PromptLibrary,
}

impl App {
    /// Load state from `ctx` and resolve the startup session.
    pub async fn load(ctx: AppContext) -> Result<Self> {
        ctx.ensure_initialized()?;
        let config = load_config(&ctx)?;
        let device = Arc::new(FileStore::new(&ctx.device_path));
        let identity = identity::from_config(&config, device.clone())?;

        let mut session =
            SessionController::new(identity, device.clone(), SessionSettings::from_config(&config));
        session.start().await;
        session.load_navigation();

        let library = PromptLibrary::open(&ctx.prompts_dir)?;
        Ok(Self {
            ctx,
            config,
            device,
            session,
            library,
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.session().user_id()
    }

    pub fn generator(&self) -> Result<GenerationService> {
        GenerationService::from_config(&self.config.generation)
    }

    /// Append an activity event. Failures are logged, never returned.
    pub fn record(&self, event: Event) {
        if !self.config.events_enabled {
            return;
        }
        if let Err(err) = append_event(&self.ctx.events_path, &event) {
            warn!(action = %event.action, error = %err, "failed to record event");
        }
    }

    pub(crate) fn save(&self) -> Result<()> {
        self.session.save_navigation()
    }
}

/// Config file, then environment overrides.
pub fn load_config(ctx: &AppContext) -> Result<Config> {
    let mut config = Config::load_or_default(&ctx.config_path)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Dispatch a command to its implementation.
///
/// `init` and `prompts detect` run without loading a session.
pub async fn dispatch(ctx: AppContext, command: Command) -> Result<()> {
    match command {
        Command::Init(args) => init::cmd_init(&ctx, args),
        Command::Onboard(args) => with_app!(ctx, app => account::cmd_onboard(&mut app, args)),
        Command::Signup(args) => with_app!(ctx, app => account::cmd_signup(&mut app, args).await),
        Command::Signin(args) => with_app!(ctx, app => account::cmd_signin(&mut app, args).await),
        Command::Signout => with_app!(ctx, app => account::cmd_signout(&mut app).await),
        Command::Upgrade => with_app!(ctx, app => account::cmd_upgrade(&mut app).await),
        Command::Whoami => with_app!(ctx, app => account::cmd_whoami(&app)),
        Command::Status => with_app!(ctx, app => navigation::cmd_status(&app)),
        Command::Navigate(args) => with_app!(ctx, app => navigation::cmd_navigate(&mut app, args)),
        Command::Select(args) => with_app!(ctx, app => navigation::cmd_select(&mut app, args)),
        Command::Prompts(cmd) => prompts::dispatch(ctx, cmd.action).await,
        Command::Preview(args) => with_app!(ctx, app => run::cmd_preview(&app, args)),
        Command::Run(args) => with_app!(ctx, app => run::cmd_run(&mut app, args).await),
        Command::Chat(args) => with_app!(ctx, app => chat::cmd_chat(&mut app, args).await),
    }
}
