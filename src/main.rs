// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! studychat - AI study assistant for your terminal
//!
//! Entry point for the studychat CLI application.

use clap::Parser;

use studychat::cli::{ChatArgs, Cli, Commands};
use studychat::config::Settings;
use studychat::error::Result;

#[path = "main/chat_runtime.rs"]
mod chat_runtime;
#[path = "main/chat_ui.rs"]
mod chat_ui;
#[path = "main/cli_commands.rs"]
mod cli_commands;

use chat_runtime::run_chat;
use cli_commands::{
    run_ask, run_export, run_history_command, run_session_command, run_settings_command,
    run_stats,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on conversation diagnostics; `RUST_LOG` still takes precedence.
    if cli.verbose > 0 {
        for directive in ["studychat::chat=debug", "studychat::remote=debug"] {
            if let Ok(parsed) = directive.parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings
    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load_from(&settings_path)?;

    // Ensure directories exist
    Settings::ensure_directories()?;

    // Dispatch to appropriate command
    let verbose = cli.verbose;
    match cli.command {
        None => {
            run_chat(ChatArgs::default(), settings, verbose).await?;
        }
        Some(Commands::Chat(args)) => {
            run_chat(args, settings, verbose).await?;
        }
        Some(Commands::Ask(args)) => {
            run_ask(args, settings, verbose).await?;
        }
        Some(Commands::History(args)) => {
            run_history_command(args, &settings)?;
        }
        Some(Commands::Stats) => {
            run_stats()?;
        }
        Some(Commands::Export(args)) => {
            run_export(args, &settings)?;
        }
        Some(Commands::Session(args)) => {
            run_session_command(args)?;
        }
        Some(Commands::Settings(args)) => {
            run_settings_command(args, settings, &settings_path)?;
        }
    }

    Ok(())
}
