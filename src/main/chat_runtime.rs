// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::PathBuf;

use studychat::attachment::{Attachment, AttachmentEncoder};
use studychat::chat::{ConversationController, Draft, SendOutcome, SuppressReason};
use studychat::cli::{parse_input_with_attachments, ChatArgs, ReplCommand};
use studychat::config::Settings;
use studychat::error::Result;
use studychat::export;
use studychat::subject::Subject;

use crate::chat_ui::{
    print_attachments, print_help, print_history_entry, print_notice, print_stats,
    print_welcome, read_user_input, study_badge, TerminalObserver,
};
use crate::cli_commands::{build_controller, command_speech, write_export};

/// Input queued for the next message
#[derive(Default)]
struct Pending {
    attachments: Vec<Attachment>,
    subject: Option<Subject>,
}

/// Run interactive chat mode
pub(super) async fn run_chat(args: ChatArgs, settings: Settings, verbose: u8) -> Result<()> {
    if verbose > 0 {
        eprintln!("[verbose] studychat starting in chat mode");
        eprintln!("[verbose] Chat webhook: {}", settings.remote.chat_url);
    }

    let controller = build_controller(&settings, command_speech(&settings))?;
    let encoder = AttachmentEncoder::new(settings.attachments.max_bytes);
    if verbose > 0 {
        eprintln!(
            "[verbose] Attachment limit: {}",
            studychat::utils::format_file_size(encoder.max_bytes())
        );
    }
    let mut pending = Pending {
        subject: args.subject,
        ..Default::default()
    };

    let greeting = controller
        .messages()
        .first()
        .map(|m| m.text.clone())
        .unwrap_or_default();
    print_welcome(&controller.session_id(), &greeting)?;

    if args.study {
        let session = controller.start_study(args.subject);
        print_notice(&format!(
            "Study session started ({}).",
            session.subject.map_or("General", Subject::name)
        ))?;
    }

    if let Some(prompt) = args.prompt {
        send(&controller, prompt, &mut pending).await;
    }

    loop {
        let badge = study_badge(controller.active_study().as_ref(), controller.elapsed_secs());
        let Some(line) = read_user_input(badge)? else {
            break;
        };
        let Some(command) = parse_input_with_attachments(&line, !pending.attachments.is_empty())
        else {
            continue;
        };

        match command {
            ReplCommand::Send(text) => send(&controller, text, &mut pending).await,
            ReplCommand::Attach(paths) => attach(&encoder, &paths, &mut pending)?,
            ReplCommand::Subject(subject) => {
                pending.subject = subject;
                match subject {
                    Some(subject) => print_notice(&format!("Next message tagged {}.", subject))?,
                    None => print_notice("Subject cleared; it will be detected from your text.")?,
                }
            }
            ReplCommand::StudyStart(subject) => {
                if let Some(previous) = controller.end_study() {
                    print_notice(&format!(
                        "Ended previous session ({}s).",
                        previous.duration_secs().unwrap_or(0)
                    ))?;
                }
                let session = controller.start_study(subject);
                print_notice(&format!(
                    "Study session started ({}).",
                    session.subject.map_or("General", Subject::name)
                ))?;
            }
            ReplCommand::StudyEnd => match controller.end_study() {
                Some(session) => print_notice(&format!(
                    "Study session ended after {} with {} messages.",
                    studychat::utils::format_duration(session.duration_secs().unwrap_or(0)),
                    session.message_count
                ))?,
                None => print_notice("No study session is running.")?,
            },
            ReplCommand::Stats => print_stats(
                &controller.study_stats(),
                controller.active_study().as_ref(),
                controller.elapsed_secs(),
            )?,
            ReplCommand::History(n) => {
                let entries = controller.recent_history(n);
                if entries.is_empty() {
                    println!("\nNo history yet.\n");
                } else {
                    println!();
                    for message in &entries {
                        print_history_entry(message);
                    }
                    println!();
                }
            }
            ReplCommand::ClearHistory => {
                controller.clear_history();
                print_notice("History cleared.")?;
            }
            ReplCommand::Reset => {
                let session_id = controller.reset_session();
                pending = Pending::default();
                print_notice(&format!("Session: {}", session_id))?;
                if let Some(greeting) = controller.messages().first() {
                    println!("{}\n", greeting.text);
                }
            }
            ReplCommand::Export { format, path } => {
                let rendered = controller.export(format)?;
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(export::suggested_filename(format, &chrono::Local::now()))
                });
                write_export(&path, &rendered)?;
            }
            ReplCommand::Share => println!("\n{}\n", controller.share_text()),
            ReplCommand::Help => print_help()?,
            ReplCommand::Quit => break,
            ReplCommand::Invalid(reason) => print_notice(&reason)?,
            ReplCommand::Unknown(command) => {
                print_notice(&format!("Unknown command {}. Type /help.", command))?
            }
        }
    }

    controller.shutdown();
    Ok(())
}

async fn send(controller: &ConversationController, text: String, pending: &mut Pending) {
    let queued = std::mem::take(pending);
    let draft = Draft::new(text)
        .with_attachments(queued.attachments)
        .with_subject(queued.subject);

    let mut observer = TerminalObserver::default();
    let outcome = controller.send_message(draft, &mut observer).await;
    if matches!(outcome, SendOutcome::Suppressed(SuppressReason::SendInFlight)) {
        let _ = print_notice("Still waiting for the previous reply.");
    }
}

fn attach(encoder: &AttachmentEncoder, paths: &[PathBuf], pending: &mut Pending) -> Result<()> {
    let batch = encoder.encode_batch(paths);
    for rejection in &batch.rejections {
        print_notice(&rejection.to_string())?;
    }
    if !batch.attachments.is_empty() {
        print_attachments(&batch.attachments);
        pending.attachments.extend(batch.attachments);
        print_notice("Press Enter to send the files alone, or type a message.")?;
    }
    Ok(())
}
