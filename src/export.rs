// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation export
//!
//! Renders the current conversation plus study statistics as plain text,
//! Markdown or JSON, and builds the short transcript used for sharing.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use serde::Serialize;

use crate::chat::message::Message;
use crate::error::Result;
use crate::study::{StudySession, StudyStats};
use crate::utils::format_duration;

/// Export file format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text transcript
    #[default]
    Text,

    /// Markdown document with a statistics table
    Markdown,

    /// Machine-readable JSON
    Json,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Everything an export needs, captured at one instant
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub messages: Vec<Message>,
    pub study_sessions: Vec<StudySession>,
    pub stats: StudyStats,
    pub session_id: String,
    pub exported_at: DateTime<Local>,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    messages: &'a [Message],
    study_sessions: &'a [StudySession],
    export_date: String,
    session_id: &'a str,
}

/// Render a snapshot in the given format
pub fn render(format: ExportFormat, snapshot: &ExportSnapshot) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(render_text(snapshot)),
        ExportFormat::Markdown => Ok(render_markdown(snapshot)),
        ExportFormat::Json => render_json(snapshot),
    }
}

/// `study-chat-export-YYYY-MM-DD.{ext}`
pub fn suggested_filename<Tz: TimeZone>(format: ExportFormat, date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "study-chat-export-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Compact transcript for sharing: `You: ...` / `Assistant: ...` blocks
pub fn share_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender_label(), m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn local_time(snapshot: &ExportSnapshot, message: &Message) -> String {
    message
        .timestamp
        .with_timezone(&snapshot.exported_at.timezone())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn attachment_names(message: &Message) -> Option<String> {
    if message.attachments.is_empty() {
        return None;
    }
    Some(
        message
            .attachments
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn render_text(snapshot: &ExportSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Study Chat Export - {}",
        snapshot.exported_at.format("%Y-%m-%d")
    );
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for message in &snapshot.messages {
        let subject = message
            .subject
            .map(|s| format!(" [{}]", s.name()))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "[{}] {}{}:",
            local_time(snapshot, message),
            message.sender_label(),
            subject
        );
        let _ = writeln!(out, "{}", message.text);
        if let Some(names) = attachment_names(message) {
            let _ = writeln!(out, "Attachments: {}", names);
        }
        out.push('\n');
    }

    let stats = &snapshot.stats;
    out.push_str("\nStudy Statistics:\n");
    out.push_str(&"-".repeat(20));
    out.push('\n');
    let _ = writeln!(out, "Total Sessions: {}", stats.total_sessions);
    let _ = writeln!(out, "Total Study Time: {}", format_duration(stats.total_time));
    let _ = writeln!(
        out,
        "Average Session: {}",
        format_duration(stats.average_session_time)
    );
    let _ = writeln!(out, "Today: {}", format_duration(stats.today_time));
    let _ = writeln!(out, "This Week: {}", format_duration(stats.week_time));
    if let Some(subject) = stats.most_studied_subject {
        let _ = writeln!(out, "Most Studied Subject: {}", subject.name());
    }
    out
}

fn render_markdown(snapshot: &ExportSnapshot) -> String {
    let mut out = String::from("# Study Chat Export\n\n");
    let _ = write!(
        out,
        "**Export Date:** {}\n\n",
        snapshot.exported_at.format("%Y-%m-%d")
    );
    out.push_str("## Conversation\n\n");

    for message in &snapshot.messages {
        let subject = message
            .subject
            .map(|s| format!(" *[{}]*", s.name()))
            .unwrap_or_default();
        let _ = writeln!(out, "### **{}**{}", message.sender_label(), subject);
        let _ = write!(out, "*{}*\n\n", local_time(snapshot, message));
        let _ = write!(out, "{}\n\n", message.text);
        if let Some(names) = attachment_names(message) {
            let _ = write!(out, "**Attachments:** {}\n\n", names);
        }
    }

    let stats = &snapshot.stats;
    out.push_str("## Study Statistics\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("|--------|-------|\n");
    let _ = writeln!(out, "| Total Sessions | {} |", stats.total_sessions);
    let _ = writeln!(
        out,
        "| Total Study Time | {} |",
        format_duration(stats.total_time)
    );
    let _ = writeln!(
        out,
        "| Average Session | {} |",
        format_duration(stats.average_session_time)
    );
    let _ = writeln!(out, "| Today | {} |", format_duration(stats.today_time));
    let _ = writeln!(out, "| This Week | {} |", format_duration(stats.week_time));
    if let Some(subject) = stats.most_studied_subject {
        let _ = writeln!(out, "| Most Studied Subject | {} |", subject.name());
    }
    out
}

fn render_json(snapshot: &ExportSnapshot) -> Result<String> {
    let export = JsonExport {
        messages: &snapshot.messages,
        study_sessions: &snapshot.study_sessions,
        export_date: snapshot.exported_at.to_rfc3339(),
        session_id: &snapshot.session_id,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}
