// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use studychat::attachment::AttachmentEncoder;
use studychat::chat::{ConversationController, Draft, SendOutcome};
use studychat::cli::{
    AskArgs, ExportArgs, HistoryArgs, SessionArgs, SessionCommands, SettingsArgs,
    SettingsCommands,
};
use studychat::config::Settings;
use studychat::error::{ApiError, Result, StudyChatError};
use studychat::export::{self, ExportSnapshot};
use studychat::history::HistoryStore;
use studychat::identity::IdentityStore;
use studychat::speech::CommandSpeech;
use studychat::storage::{FileStorage, Storage};
use studychat::study::{StudyTracker, SystemClock};

use crate::chat_ui::{
    print_attachments, print_history_entry, print_notice, print_stats, TerminalObserver,
};

/// Open the durable store under the data directory
pub(super) fn open_storage() -> Arc<dyn Storage> {
    FileStorage::open_or_memory(Settings::data_dir())
}

/// Speech output for the configured program, when replies are spoken
pub(super) fn command_speech(settings: &Settings) -> Option<Arc<CommandSpeech>> {
    if !settings.conversation.auto_speak {
        return None;
    }
    settings
        .conversation
        .speech_command
        .as_ref()
        .map(|program| Arc::new(CommandSpeech::new(program.clone())))
}

/// Build a controller wired to the configured webhooks and local storage
pub(super) fn build_controller(
    settings: &Settings,
    speech: Option<Arc<CommandSpeech>>,
) -> Result<ConversationController> {
    let mut builder = ConversationController::builder(settings.clone()).with_storage(open_storage());
    if let Some(speech) = speech {
        builder = builder.with_speech(speech);
    }
    builder.build()
}

/// Ask a single question and print the streamed reply
pub(super) async fn run_ask(args: AskArgs, settings: Settings, verbose: u8) -> Result<()> {
    let mut prompt = args.prompt.unwrap_or_default();
    if args.stdin {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str(input.trim_end());
    }

    let encoder = AttachmentEncoder::new(settings.attachments.max_bytes);
    let batch = encoder.encode_batch(&args.attach);
    for rejection in &batch.rejections {
        print_notice(&rejection.to_string())?;
    }
    if verbose > 0 && !batch.attachments.is_empty() {
        eprintln!("[verbose] Attaching {} file(s)", batch.attachments.len());
        print_attachments(&batch.attachments);
    }

    let draft = Draft::new(prompt)
        .with_attachments(batch.attachments)
        .with_subject(args.subject);
    if draft.is_empty() {
        return Err(StudyChatError::InvalidInput(
            "Nothing to send: give a question or at least one readable file".to_string(),
        ));
    }

    let speech = command_speech(&settings);
    let controller = build_controller(&settings, speech.clone())?;
    let mut observer = TerminalObserver::default();
    let outcome = controller.send_message(draft, &mut observer).await;
    // An auto-started study session is abandoned, not logged.
    controller.shutdown();
    if let Some(speech) = speech {
        speech.finish();
    }

    match outcome {
        SendOutcome::Failed(_) => Err(ApiError::Network(
            "the assistant could not be reached".to_string(),
        )
        .into()),
        _ => Ok(()),
    }
}

pub(super) fn run_history_command(args: HistoryArgs, settings: &Settings) -> Result<()> {
    let mut store = HistoryStore::open(open_storage(), settings.conversation.history_limit);

    if args.clear {
        let removed = store.len();
        store.clear();
        println!("Cleared {} entries from history.", removed);
        return Ok(());
    }

    let entries: Vec<_> = match &args.search {
        Some(query) => store.search(query).into_iter().take(args.limit).collect(),
        None => store.recent(args.limit).iter().collect(),
    };

    if entries.is_empty() {
        match &args.search {
            Some(query) => println!("\nNo history matching '{}'.\n", query),
            None => println!("\nNo history yet.\n"),
        }
        return Ok(());
    }

    match &args.search {
        Some(query) => println!("\nHistory matching '{}':\n", query),
        None => println!("\nRecent history ({} of {}):\n", entries.len(), store.len()),
    }
    for message in entries {
        print_history_entry(message);
    }
    println!();
    Ok(())
}

pub(super) fn run_stats() -> Result<()> {
    let tracker = StudyTracker::open(open_storage(), Arc::new(SystemClock));
    print_stats(&tracker.stats(), None, 0)
}

/// Export durable history (oldest first) with study statistics
pub(super) fn run_export(args: ExportArgs, settings: &Settings) -> Result<()> {
    let storage = open_storage();
    let history = HistoryStore::open(storage.clone(), settings.conversation.history_limit);
    let tracker = StudyTracker::open(storage.clone(), Arc::new(SystemClock));
    let mut identity = IdentityStore::new(storage);

    let mut messages = history.entries().to_vec();
    messages.reverse();
    let snapshot = ExportSnapshot {
        messages,
        study_sessions: tracker.sessions().to_vec(),
        stats: tracker.stats(),
        session_id: identity.get_or_create(),
        exported_at: Local::now(),
    };
    let rendered = export::render(args.format, &snapshot)?;

    match args.output {
        Some(path) if path == Path::new("-") => print!("{}", rendered),
        output => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(export::suggested_filename(args.format, &snapshot.exported_at))
            });
            write_export(&path, &rendered)?;
        }
    }
    Ok(())
}

/// Write an export file and report where it went
pub(super) fn write_export(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub(super) fn run_session_command(args: SessionArgs) -> Result<()> {
    let mut identity = IdentityStore::new(open_storage());
    match args.command {
        SessionCommands::Show => println!("{}", identity.get_or_create()),
        SessionCommands::Reset => println!("New session: {}", identity.reset()),
    }
    Ok(())
}

/// Run settings subcommands
pub(super) fn run_settings_command(
    args: SettingsArgs,
    settings: Settings,
    settings_path: &Path,
) -> Result<()> {
    match args.command.unwrap_or(SettingsCommands::Show) {
        SettingsCommands::Show => {
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{}", json);
        }
        SettingsCommands::Path => {
            println!("{}", settings_path.display());
        }
        SettingsCommands::Reset => {
            Settings::default().save_to(settings_path)?;
            println!("Settings reset to defaults.");
        }
    }
    Ok(())
}
