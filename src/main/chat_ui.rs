// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

use studychat::attachment::Attachment;
use studychat::chat::{ConversationObserver, Message};
use studychat::error::{Result, StudyChatError};
use studychat::links;
use studychat::study::{StudySession, StudyStats};
use studychat::subject::Subject;
use studychat::utils::{format_duration, format_file_size, truncate_chars};

/// Print welcome message
pub(super) fn print_welcome(session_id: &str, greeting: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    println!("studychat v{}", env!("CARGO_PKG_VERSION"));
    stdout.execute(ResetColor)?;
    println!("AI study assistant for your terminal");
    println!("Session: {}", session_id);
    println!("Type /help for commands, exit to quit\n");
    print_assistant_text(greeting)?;
    Ok(())
}

/// Print help message
pub(super) fn print_help() -> Result<()> {
    println!("\nCommands:");
    println!("  /attach <path>...          - Attach files to the next message");
    println!("  /send [text]               - Send now (a blank line sends queued files)");
    println!("  /subject <id|none>         - Tag the next message with a subject");
    println!("  /study start [subject]     - Start a study session");
    println!("  /study end                 - End the current study session");
    println!("  /stats                     - Show study statistics");
    println!("  /history [n]               - Show recent history");
    println!("  /clear-history             - Delete all history");
    println!("  /reset                     - Start a new session");
    println!("  /export <text|markdown|json> [path] - Export the conversation");
    println!("  /share                     - Print a shareable transcript");
    println!("  /help                      - Show this help message");
    println!("  exit                       - Exit studychat");
    println!("\nSubjects:");
    let ids: Vec<&str> = Subject::ALL.iter().map(|s| s.id()).collect();
    println!("  {}", ids.join(", "));
    println!();
    Ok(())
}

/// Read user input; `None` at end of input
pub(super) fn read_user_input(badge: Option<String>) -> Result<Option<String>> {
    let mut stdout = io::stdout();
    if let Some(badge) = badge {
        stdout.execute(SetForegroundColor(Color::Magenta))?;
        print!("[{}] ", badge);
        stdout.execute(ResetColor)?;
    }
    stdout.execute(SetForegroundColor(Color::Green))?;
    print!("you: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Badge shown before the prompt while a study session runs
pub(super) fn study_badge(active: Option<&StudySession>, elapsed_secs: u64) -> Option<String> {
    active.map(|session| {
        let subject = session.subject.map_or("Study", Subject::name);
        format!("{} {}", subject, format_duration(elapsed_secs))
    })
}

pub(super) fn print_assistant_prefix() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    print!("\nassistant: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

fn print_assistant_text(text: &str) -> Result<()> {
    print_assistant_prefix()?;
    println!("{}\n", text);
    Ok(())
}

/// Print a yellow notice line
pub(super) fn print_notice(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Yellow))?;
    println!("{}", text);
    stdout.execute(ResetColor)?;
    Ok(())
}

/// List attachments queued for the next message
pub(super) fn print_attachments(attachments: &[Attachment]) {
    for attachment in attachments {
        let icon = if attachment.is_image() { "🖼" } else { "📎" };
        println!(
            "  {} {} ({}, {})",
            icon,
            attachment.name,
            attachment.mime_type,
            format_file_size(attachment.size)
        );
    }
}

/// Print detected links under a reply, videos first
pub(super) fn print_links(text: &str) -> Result<()> {
    let videos = links::detect_youtube_links(text);
    let others: Vec<&str> = links::extract_urls(text)
        .into_iter()
        .filter(|url| links::youtube_video_id(url).is_none())
        .collect();
    if videos.is_empty() && others.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::DarkGrey))?;
    for video in videos {
        println!("  ▶ YouTube video {} ({})", video.video_id, video.thumbnail);
    }
    for url in others {
        println!("  🔗 {}", url);
    }
    stdout.execute(ResetColor)?;
    Ok(())
}

/// One history line: `date | sender [subject] | text`
pub(super) fn print_history_entry(message: &Message) {
    let date = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");
    let subject = message
        .subject
        .map(|s| format!(" [{}]", s.name()))
        .unwrap_or_default();
    let text = truncate_chars(&message.text.replace('\n', " "), 80);
    println!("  {} | {}{} | {}", date, message.sender_label(), subject, text);
}

/// Print study statistics and the running session, if any
pub(super) fn print_stats(
    stats: &StudyStats,
    active: Option<&StudySession>,
    elapsed_secs: u64,
) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    println!("\nStudy statistics");
    stdout.execute(ResetColor)?;
    println!("  Total sessions:       {}", stats.total_sessions);
    println!("  Total study time:     {}", format_duration(stats.total_time));
    println!(
        "  Average session:      {}",
        format_duration(stats.average_session_time)
    );
    println!("  Today:                {}", format_duration(stats.today_time));
    println!("  This week:            {}", format_duration(stats.week_time));
    println!("  Most studied subject: {}", stats.most_studied_name());

    if let Some(session) = active {
        println!(
            "\n  Active: {} for {} ({} messages)",
            session.subject.map_or("General study", Subject::name),
            format_duration(elapsed_secs),
            session.message_count
        );
    }
    println!();
    Ok(())
}

/// Streams the assistant reply to stdout as it grows
#[derive(Default)]
pub(super) struct TerminalObserver {
    streamed: String,
    prefixed: bool,
}

impl TerminalObserver {
    fn ensure_prefix(&mut self) {
        if !self.prefixed {
            let _ = print_assistant_prefix();
            self.prefixed = true;
        }
    }
}

impl ConversationObserver for TerminalObserver {
    fn on_stream_update(&mut self, message: &Message) {
        self.ensure_prefix();
        if let Some(delta) = message.text.strip_prefix(self.streamed.as_str()) {
            print!("{}", delta);
            let _ = io::stdout().flush();
        }
        self.streamed = message.text.clone();
    }

    fn on_settled(&mut self, message: &Message) {
        self.ensure_prefix();
        match message.text.strip_prefix(self.streamed.as_str()) {
            Some(rest) => print!("{}", rest),
            // A fallback replaced what was streamed.
            None => print!("\n{}", message.text),
        }
        println!("\n");
        let _ = print_links(&message.text);
    }

    fn on_failure(&mut self, error: &StudyChatError, apology: &Message) {
        tracing::debug!("send failed: {}", error);
        self.ensure_prefix();
        if !self.streamed.is_empty() {
            println!();
        }
        println!("{}\n", apology.text);
    }
}
