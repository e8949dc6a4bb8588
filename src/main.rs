//! Promptly command-line client.
//!
//! Parses arguments, sets up logging, dispatches to the command handlers and
//! maps errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use promptly::config::Config;
use promptly::context::AppContext;
use promptly::{exit_codes, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let ctx = match AppContext::resolve(cli.data_dir.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    // A broken config is reported by the command itself; logging just
    // falls back to its defaults.
    let config_filter = Config::load_or_default(&ctx.config_path)
        .ok()
        .and_then(|config| config.log_filter);
    logging::init(cli.verbose, config_filter.as_deref());

    match commands::dispatch(ctx, cli.command).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
