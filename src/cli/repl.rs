// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Input parsing for the interactive chat
//!
//! Pure functions that turn one line of user input into a [`ReplCommand`].
//! Lines that do not start with `/` are messages. A blank line sends queued
//! attachments on their own.

use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::subject::Subject;

/// Default number of history entries listed by `/history`
pub const DEFAULT_HISTORY_LINES: usize = 10;

/// A parsed line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send
    Send(String),
    /// Queue files for the next message
    Attach(Vec<PathBuf>),
    /// Select a subject for the next message (`None` clears it)
    Subject(Option<Subject>),
    StudyStart(Option<Subject>),
    StudyEnd,
    Stats,
    History(usize),
    ClearHistory,
    Reset,
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Share,
    Help,
    Quit,
    /// A recognised command with bad arguments
    Invalid(String),
    /// A `/word` that is not a command
    Unknown(String),
}

/// Check if user input is an exit command.
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim().to_lowercase();
    matches!(trimmed.as_str(), "exit" | "quit" | "/exit" | "/quit")
}

/// Parse one line of input, sending a blank line when attachments are queued.
pub fn parse_input_with_attachments(input: &str, attachments_pending: bool) -> Option<ReplCommand> {
    if attachments_pending && input.trim().is_empty() {
        return Some(ReplCommand::Send(String::new()));
    }
    parse_input(input)
}

/// Parse one line of input; blank lines yield `None`.
pub fn parse_input(input: &str) -> Option<ReplCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_exit_command(trimmed) {
        return Some(ReplCommand::Quit);
    }
    if !trimmed.starts_with('/') {
        return Some(ReplCommand::Send(trimmed.to_string()));
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let parsed = match command.as_str() {
        "/attach" => {
            if args.is_empty() {
                ReplCommand::Invalid("usage: /attach <path>...".to_string())
            } else {
                ReplCommand::Attach(args.iter().map(PathBuf::from).collect())
            }
        }
        "/subject" => match args.as_slice() {
            [] | ["none"] => ReplCommand::Subject(None),
            _ => match Subject::from_id(&args.join(" ")) {
                Some(subject) => ReplCommand::Subject(Some(subject)),
                None => ReplCommand::Invalid(format!("unknown subject '{}'", args.join(" "))),
            },
        },
        "/study" => match args.as_slice() {
            ["start"] => ReplCommand::StudyStart(None),
            ["start", rest @ ..] => match Subject::from_id(&rest.join(" ")) {
                Some(subject) => ReplCommand::StudyStart(Some(subject)),
                None => ReplCommand::Invalid(format!("unknown subject '{}'", rest.join(" "))),
            },
            ["end"] | ["stop"] => ReplCommand::StudyEnd,
            _ => ReplCommand::Invalid("usage: /study start [subject] | /study end".to_string()),
        },
        "/send" => ReplCommand::Send(
            trimmed
                .split_once(char::is_whitespace)
                .map_or("", |(_, rest)| rest.trim())
                .to_string(),
        ),
        "/stats" => ReplCommand::Stats,
        "/history" => match args.first() {
            None => ReplCommand::History(DEFAULT_HISTORY_LINES),
            Some(n) => match n.parse() {
                Ok(n) => ReplCommand::History(n),
                Err(_) => ReplCommand::Invalid(format!("invalid count '{}'", n)),
            },
        },
        "/clear-history" => ReplCommand::ClearHistory,
        "/reset" | "/new" => ReplCommand::Reset,
        "/export" => match args.as_slice() {
            [] => ReplCommand::Export {
                format: ExportFormat::Text,
                path: None,
            },
            [format, rest @ ..] => match format.parse::<ExportFormat>() {
                Ok(format) => ReplCommand::Export {
                    format,
                    path: rest.first().map(PathBuf::from),
                },
                Err(e) => ReplCommand::Invalid(e),
            },
        },
        "/share" => ReplCommand::Share,
        "/help" => ReplCommand::Help,
        other => ReplCommand::Unknown(other.to_string()),
    };
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_plain_text() {
        assert_eq!(parse_input("   "), None);
        assert_eq!(
            parse_input("  What is gravity? "),
            Some(ReplCommand::Send("What is gravity?".to_string()))
        );
    }

    #[test]
    fn test_exit_variants() {
        for input in ["exit", "QUIT", "/quit", "/exit"] {
            assert_eq!(parse_input(input), Some(ReplCommand::Quit));
        }
    }

    #[test]
    fn test_attach() {
        assert_eq!(
            parse_input("/attach notes.md scan.png"),
            Some(ReplCommand::Attach(vec![
                PathBuf::from("notes.md"),
                PathBuf::from("scan.png")
            ]))
        );
        assert!(matches!(parse_input("/attach"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_subject() {
        assert_eq!(
            parse_input("/subject physical education"),
            Some(ReplCommand::Subject(Some(Subject::PhysicalEducation)))
        );
        assert_eq!(parse_input("/subject none"), Some(ReplCommand::Subject(None)));
        assert!(matches!(parse_input("/subject alchemy"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_study() {
        assert_eq!(
            parse_input("/study start math"),
            Some(ReplCommand::StudyStart(Some(Subject::Mathematics)))
        );
        assert_eq!(parse_input("/study start"), Some(ReplCommand::StudyStart(None)));
        assert_eq!(parse_input("/study end"), Some(ReplCommand::StudyEnd));
        assert!(matches!(parse_input("/study"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_history() {
        assert_eq!(
            parse_input("/history"),
            Some(ReplCommand::History(DEFAULT_HISTORY_LINES))
        );
        assert_eq!(parse_input("/history 25"), Some(ReplCommand::History(25)));
        assert!(matches!(parse_input("/history lots"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_export() {
        assert_eq!(
            parse_input("/export md out.md"),
            Some(ReplCommand::Export {
                format: ExportFormat::Markdown,
                path: Some(PathBuf::from("out.md"))
            })
        );
        assert_eq!(
            parse_input("/export"),
            Some(ReplCommand::Export {
                format: ExportFormat::Text,
                path: None
            })
        );
        assert!(matches!(parse_input("/export pdf"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_blank_line_sends_queued_attachments() {
        assert_eq!(
            parse_input_with_attachments("  ", true),
            Some(ReplCommand::Send(String::new()))
        );
        assert_eq!(parse_input_with_attachments("  ", false), None);
        assert_eq!(
            parse_input_with_attachments("look at this", true),
            Some(ReplCommand::Send("look at this".to_string()))
        );
    }

    #[test]
    fn test_send_command() {
        assert_eq!(parse_input("/send"), Some(ReplCommand::Send(String::new())));
        assert_eq!(
            parse_input("/send  what  is this?"),
            Some(ReplCommand::Send("what  is this?".to_string()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_input("/dance now"),
            Some(ReplCommand::Unknown("/dance".to_string()))
        );
    }
}
