//! CLI argument parsing for promptly.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Implementations live in the `commands` module.

use clap::{Args, Parser, Subcommand};
use promptly::session::Screen;
use std::path::PathBuf;

/// Promptly: a prompt library client.
///
/// Prompts are reusable texts with `{{variable}}` placeholders. Fill in the
/// variables, preview the result, and run it through the generation service.
#[derive(Parser, Debug)]
#[command(name = "promptly")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding config, device state and the prompt library.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory, a default config and the starter prompts.
    Init(InitArgs),

    /// Answer the onboarding questions and start as a local user.
    Onboard(OnboardArgs),

    /// Create an account.
    Signup(SignupArgs),

    /// Sign in to an existing account.
    Signin(SigninArgs),

    /// Sign out of the current account.
    Signout,

    /// Upgrade the signed-in account to PRO.
    Upgrade,

    /// Show the current user and quota.
    Whoami,

    /// Show session, screen and library summary.
    Status,

    /// Go to a screen.
    Navigate(NavigateArgs),

    /// Pick a prompt for execution.
    Select(SelectArgs),

    /// Manage the prompt library.
    Prompts(PromptsCommand),

    /// Render a prompt with the given values, without running it.
    Preview(RunArgs),

    /// Run a prompt through the generation service.
    Run(RunArgs),

    /// Talk to the assistant.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file with defaults.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct OnboardArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub profession: String,

    #[arg(long, default_value = "")]
    pub email: String,

    /// Open the sign-up form pre-filled with these answers instead.
    #[arg(long, conflicts_with = "sign_in")]
    pub sign_up: bool,

    /// Open the sign-in form instead.
    #[arg(long)]
    pub sign_in: bool,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "PROMPTLY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Defaults to the password.
    #[arg(long)]
    pub confirm_password: Option<String>,

    /// Defaults to the onboarding answer, if any.
    #[arg(long)]
    pub name: Option<String>,

    /// Defaults to the onboarding answer, if any.
    #[arg(long)]
    pub profession: Option<String>,
}

#[derive(Args, Debug)]
pub struct SigninArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "PROMPTLY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    #[arg(value_enum)]
    pub screen: Screen,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    pub prompt_id: String,
}

#[derive(Args, Debug)]
pub struct PromptsCommand {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List visible prompts, most used first.
    List(ListArgs),

    /// Show a prompt and its variables.
    Show(ShowArgs),

    /// Create a prompt.
    Create(CreateArgs),

    /// Edit a prompt you own.
    Edit(EditArgs),

    /// Set example, default or required flag of a variable.
    Configure(ConfigureArgs),

    /// Delete a prompt you own.
    Delete(ShowArgs),

    /// Print the variables found in a text.
    Detect(DetectArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Match title, description, content or profession.
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    /// Only prompts you created.
    #[arg(long)]
    pub mine: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub prompt_id: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub content: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub category: String,

    #[arg(long, default_value = "")]
    pub tone: String,

    /// Defaults to your profession.
    #[arg(long, default_value = "")]
    pub profession: String,

    /// Publish to the community (always on for free accounts).
    #[arg(long)]
    pub public: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub prompt_id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub tone: Option<String>,

    #[arg(long)]
    pub profession: Option<String>,

    #[arg(long)]
    pub public: Option<bool>,
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    pub prompt_id: String,

    pub variable: String,

    #[arg(long)]
    pub example: Option<String>,

    #[arg(long = "default")]
    pub default_value: Option<String>,

    #[arg(long)]
    pub required: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    pub text: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Defaults to the selected prompt.
    pub prompt_id: Option<String>,

    /// Variable value as NAME=VALUE; repeatable.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    pub message: Option<String>,

    /// Send with this prompt as context.
    #[arg(long, conflicts_with = "unbind")]
    pub prompt: Option<String>,

    /// Stop sending with a prompt as context.
    #[arg(long)]
    pub unbind: bool,

    /// Start a new conversation.
    #[arg(long)]
    pub reset: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}
