// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for studychat.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::subject::Subject;

/// studychat - AI study assistant for your terminal
#[derive(Parser, Debug)]
#[command(name = "studychat")]
#[command(version, about = "AI study assistant for your terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive chat (default when no command given)
    Chat(ChatArgs),

    /// Ask a single question (non-interactive)
    Ask(AskArgs),

    /// Show or manage message history
    History(HistoryArgs),

    /// Show study statistics
    Stats,

    /// Export the conversation and study statistics
    Export(ExportArgs),

    /// Show or reset the session identifier
    Session(SessionArgs),

    /// Manage configuration
    #[command(alias = "config")]
    Settings(SettingsArgs),
}

/// Parse a subject id or display name
pub fn parse_subject(value: &str) -> Result<Subject, String> {
    Subject::from_id(value).ok_or_else(|| {
        let ids: Vec<&str> = Subject::ALL.iter().map(|s| s.id()).collect();
        format!("unknown subject '{}' (expected one of: {})", value, ids.join(", "))
    })
}

/// Arguments for the chat subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ChatArgs {
    /// Initial message (optional)
    pub prompt: Option<String>,

    /// Subject to tag messages with
    #[arg(short, long, value_parser = parse_subject)]
    pub subject: Option<Subject>,

    /// Start a study session right away
    #[arg(long)]
    pub study: bool,
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question to ask
    pub prompt: Option<String>,

    /// Files to attach
    #[arg(short, long, num_args = 1..)]
    pub attach: Vec<PathBuf>,

    /// Subject to tag the question with
    #[arg(short, long, value_parser = parse_subject)]
    pub subject: Option<Subject>,

    /// Read prompt from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for history management
#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Only show entries containing this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Clear all history
    #[arg(long)]
    pub clear: bool,
}

/// Arguments for the export subcommand
#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ExportFormat,

    /// Output file (defaults to study-chat-export-<date>.<ext>; "-" for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for session management
#[derive(clap::Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Print the current session identifier
    Show,

    /// Generate a fresh session identifier
    Reset,
}

/// Arguments for settings/config
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: Option<SettingsCommands>,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show current configuration
    Show,

    /// Print the settings file location
    Path,

    /// Reset configuration to defaults
    Reset,
}
