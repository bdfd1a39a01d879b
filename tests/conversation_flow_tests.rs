// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use studychat::chat::{
    Author, ConversationController, Draft, NoopObserver, SendOutcome, APOLOGY_MESSAGE,
    RESET_MESSAGE, WELCOME_MESSAGE,
};
use studychat::config::Settings;
use studychat::export::ExportFormat;
use studychat::remote::{MockTransport, ScriptedReply};
use studychat::storage::{FileStorage, Storage};
use studychat::study::ManualClock;
use studychat::subject::Subject;

fn start_time() -> DateTime<Utc> {
    "2025-06-15T12:00:00Z".parse().unwrap()
}

fn quick_settings() -> Settings {
    let mut settings = Settings::default();
    settings.conversation.failure_delay_ms = 0;
    settings
}

fn open_storage(dir: &TempDir) -> Arc<dyn Storage> {
    Arc::new(FileStorage::open(dir.path()).unwrap())
}

fn controller(
    settings: Settings,
    storage: Arc<dyn Storage>,
    transport: MockTransport,
    clock: Arc<ManualClock>,
) -> ConversationController {
    ConversationController::builder(settings)
        .with_storage(storage)
        .with_transport(Arc::new(transport))
        .with_clock(clock)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_history_and_session_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let transport = MockTransport::new().with_reply(ScriptedReply::items(&["Hi ", "there!"]));

    let first = controller(quick_settings(), open_storage(&dir), transport, clock.clone());
    let session_id = first.session_id();
    let outcome = first.send_message(Draft::new("Hello"), &mut NoopObserver).await;
    let SendOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, "Hi there!");
    first.shutdown();
    drop(first);

    let second = controller(
        quick_settings(),
        open_storage(&dir),
        MockTransport::new(),
        clock,
    );
    assert_eq!(second.session_id(), session_id);

    // Newest first: the reply, then the question.
    let history = second.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text, "Hi there!");
    assert_eq!(history[0].author, Author::Assistant);
    assert_eq!(history[1].text, "Hello");

    // The in-memory conversation starts fresh with only the welcome.
    let messages = second.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, WELCOME_MESSAGE);
}

#[tokio::test]
async fn test_history_is_capped_across_sends() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let mut settings = quick_settings();
    settings.conversation.history_limit = 3;

    let chat = controller(
        settings,
        open_storage(&dir),
        MockTransport::new().with_reply(ScriptedReply::items(&["ok"])),
        clock,
    );
    for text in ["one", "two", "three"] {
        chat.send_message(Draft::new(text), &mut NoopObserver).await;
    }

    let history = chat.history();
    assert_eq!(history.len(), 3);
    let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["ok", "three", "ok"]);
}

#[tokio::test]
async fn test_detected_subject_starts_study_and_feeds_stats() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let transport = MockTransport::new().with_reply(ScriptedReply::items(&["Let's see."]));
    let chat = controller(quick_settings(), open_storage(&dir), transport.clone(), clock.clone());

    chat.send_message(Draft::new("Help me balance this equation"), &mut NoopObserver)
        .await;
    let active = chat.active_study().expect("study session auto-started");
    assert_eq!(active.subject, Some(Subject::Mathematics));
    assert_eq!(active.message_count, 0);
    assert_eq!(
        transport.last_request().unwrap().subject,
        Some(Subject::Mathematics)
    );

    chat.send_message(Draft::new("And the next step?"), &mut NoopObserver)
        .await;
    assert_eq!(chat.active_study().unwrap().message_count, 1);

    clock.advance(Duration::seconds(600));
    let ended = chat.end_study().unwrap();
    assert_eq!(ended.duration_secs(), Some(600));

    let stats = chat.study_stats();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_time, 600);
    assert_eq!(stats.most_studied_subject, Some(Subject::Mathematics));

    // The log is durable.
    drop(chat);
    let reopened = controller(quick_settings(), open_storage(&dir), MockTransport::new(), clock);
    assert_eq!(reopened.study_sessions().len(), 1);
    assert!(reopened.active_study().is_none());
}

#[tokio::test]
async fn test_shutdown_abandons_auto_started_session() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let transport = MockTransport::new().with_reply(ScriptedReply::items(&["Sure."]));
    let chat = controller(quick_settings(), open_storage(&dir), transport, clock.clone());

    chat.send_message(Draft::new("Help me balance this equation"), &mut NoopObserver)
        .await;
    assert!(chat.active_study().is_some());
    chat.shutdown();
    drop(chat);

    let reopened = controller(quick_settings(), open_storage(&dir), MockTransport::new(), clock);
    assert!(reopened.study_sessions().is_empty());
    assert!(reopened.active_study().is_none());
    assert_eq!(reopened.study_stats().total_sessions, 0);
}

#[tokio::test]
async fn test_reset_keeps_history_but_changes_session() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let chat = controller(
        quick_settings(),
        open_storage(&dir),
        MockTransport::new(),
        clock,
    );
    chat.send_message(Draft::new("Hello"), &mut NoopObserver).await;
    let before = chat.session_id();

    let after = chat.reset_session();
    assert_ne!(before, after);
    assert_eq!(chat.session_id(), after);

    let messages = chat.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, RESET_MESSAGE);
    assert_eq!(chat.history().len(), 2);
}

#[tokio::test]
async fn test_network_failure_records_apology() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let transport =
        MockTransport::new().with_reply(ScriptedReply::NetworkError("connection refused".into()));
    let chat = controller(quick_settings(), open_storage(&dir), transport, clock);

    let outcome = chat.send_message(Draft::new("Hello?"), &mut NoopObserver).await;
    assert!(matches!(outcome, SendOutcome::Failed(_)));
    assert!(!chat.is_busy());

    let history = chat.history();
    assert_eq!(history[0].text, APOLOGY_MESSAGE);
    assert_eq!(history[1].text, "Hello?");
}

#[tokio::test]
async fn test_export_json_lists_conversation() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let chat = controller(
        quick_settings(),
        open_storage(&dir),
        MockTransport::new().with_reply(ScriptedReply::items(&["Paris."])),
        clock,
    );
    chat.send_message(Draft::new("Capital of France?"), &mut NoopObserver)
        .await;

    let json: serde_json::Value =
        serde_json::from_str(&chat.export(ExportFormat::Json).unwrap()).unwrap();
    assert_eq!(json["session_id"], chat.session_id());
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["text"], "Capital of France?");
    assert_eq!(messages[2]["text"], "Paris.");

    let shared = chat.share_text();
    assert!(shared.ends_with("You: Capital of France?\n\nAssistant: Paris."));
}
