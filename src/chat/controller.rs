// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation controller
//!
//! Owns the in-memory conversation and drives one send at a time through
//! `Idle -> Sending -> Streaming -> Settled -> Idle`. A second send while
//! one is in flight is suppressed, never queued.
//!
//! All methods take `&self`. Internal state sits behind short-lived mutex
//! guards that are never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::chat::message::Message;
use crate::chat::streaming::{DecodeUpdate, StreamDecoder};
use crate::config::Settings;
use crate::error::{Result, StudyChatError};
use crate::export::{self, ExportFormat, ExportSnapshot};
use crate::history::HistoryStore;
use crate::identity::IdentityStore;
use crate::remote::{OutboundRequest, Transport, WebhookTransport};
use crate::speech::SpeechOutput;
use crate::storage::{FileStorage, Storage};
use crate::study::{Clock, StudySession, StudyStats, StudyTracker, SystemClock};
use crate::subject::{self, Subject};

/// Greeting shown when the conversation opens
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your AI learning assistant. How can I help you with your studies today?";

/// Greeting shown after the session is reset
pub const RESET_MESSAGE: &str =
    "New session started! I'm your AI learning assistant. How can I help you with your studies today?";

/// Reply shown when the service could not be reached
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";

/// Reply shown when a response arrived but yielded no text
pub const DECODE_FALLBACK_MESSAGE: &str = "Sorry, there was an error processing the response.";

/// What the user is about to send
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub attachments: Vec<Attachment>,
    /// Explicit subject selection; wins over keyword detection
    pub subject: Option<Subject>,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_subject(mut self, subject: Option<Subject>) -> Self {
        self.subject = subject;
        self
    }

    /// No text worth sending and nothing attached
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// Text recorded for the user message
    fn display_text(&self) -> String {
        if self.text.trim().is_empty() && !self.attachments.is_empty() {
            format!("📎 Sent {} file(s)", self.attachments.len())
        } else {
            self.text.clone()
        }
    }
}

/// Why a send did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Blank text and no attachments
    EmptyDraft,
    /// Another send has not settled yet
    SendInFlight,
}

/// Result of [`ConversationController::send_message`]
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Nothing was sent
    Suppressed(SuppressReason),
    /// The service answered; carries the finalized assistant message
    Replied(Message),
    /// The service could not be reached; carries the apology message
    Failed(Message),
}

/// Per-controller send state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
    Streaming {
        message_id: Uuid,
    },
    Settled,
}

/// Hooks for presenting a send as it progresses
pub trait ConversationObserver: Send {
    /// The user message was recorded
    fn on_user_message(&mut self, _message: &Message) {}

    /// The in-flight assistant message grew
    fn on_stream_update(&mut self, _message: &Message) {}

    /// The assistant reply is final
    fn on_settled(&mut self, _message: &Message) {}

    /// The send failed; `apology` has been appended in place of a reply
    fn on_failure(&mut self, _error: &StudyChatError, _apology: &Message) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl ConversationObserver for NoopObserver {}

/// Restores `Idle` when a send leaves scope, whichever way it exits
struct InFlight<'a> {
    state: &'a Mutex<SendState>,
}

impl<'a> InFlight<'a> {
    /// Claim the controller for one send, or `None` if it is busy
    fn acquire(state: &'a Mutex<SendState>) -> Option<Self> {
        let mut current = lock(state);
        if *current != SendState::Idle {
            return None;
        }
        *current = SendState::Sending;
        Some(Self { state })
    }

    fn set(&self, next: SendState) {
        *lock(self.state) = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SendState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Conversation lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

struct Inner {
    messages: Vec<Message>,
    identity: IdentityStore,
    history: HistoryStore,
    study: StudyTracker,
}

/// Builder for creating ConversationController instances
pub struct ConversationBuilder {
    settings: Settings,
    storage: Option<Arc<dyn Storage>>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    speech: Option<Arc<dyn SpeechOutput>>,
}

impl ConversationBuilder {
    /// Create a new builder with settings
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            storage: None,
            transport: None,
            clock: None,
            speech: None,
        }
    }

    /// Set the durable store (defaults to files under the data directory)
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the transport (defaults to the configured webhooks)
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enable spoken replies
    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Build the controller, resolving the session identifier and loading
    /// history and the study log.
    pub fn build(self) -> Result<ConversationController> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(WebhookTransport::new(&self.settings.remote)?),
        };
        let storage = self
            .storage
            .unwrap_or_else(|| FileStorage::open_or_memory(Settings::data_dir()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let mut identity = IdentityStore::new(storage.clone());
        identity.get_or_create();
        let history = HistoryStore::open(storage.clone(), self.settings.conversation.history_limit);
        let study = StudyTracker::open(storage, clock.clone());

        tracing::debug!(transport = transport.name(), "Conversation ready");

        Ok(ConversationController {
            inner: Mutex::new(Inner {
                messages: vec![Message::assistant(WELCOME_MESSAGE).at(clock.now())],
                identity,
                history,
                study,
            }),
            state: Mutex::new(SendState::Idle),
            transport,
            speech: self.speech,
            settings: self.settings,
            clock,
        })
    }
}

/// The conversation and everything it persists
pub struct ConversationController {
    inner: Mutex<Inner>,
    state: Mutex<SendState>,
    transport: Arc<dyn Transport>,
    speech: Option<Arc<dyn SpeechOutput>>,
    settings: Settings,
    clock: Arc<dyn Clock>,
}

impl ConversationController {
    /// Create a builder for constructing a ConversationController
    pub fn builder(settings: Settings) -> ConversationBuilder {
        ConversationBuilder::new(settings)
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Current send state
    pub fn send_state(&self) -> SendState {
        lock(&self.state).clone()
    }

    /// Whether a send is in flight
    pub fn is_busy(&self) -> bool {
        self.send_state() != SendState::Idle
    }

    /// Send one user message and wait for the reply to settle.
    pub async fn send_message(
        &self,
        draft: Draft,
        observer: &mut dyn ConversationObserver,
    ) -> SendOutcome {
        if draft.is_empty() {
            return SendOutcome::Suppressed(SuppressReason::EmptyDraft);
        }
        let Some(guard) = InFlight::acquire(&self.state) else {
            tracing::debug!("Send suppressed: another send is in flight");
            return SendOutcome::Suppressed(SuppressReason::SendInFlight);
        };

        let subject = draft.subject.or_else(|| subject::detect(&draft.text));
        let user_message =
            Message::user(draft.display_text(), draft.attachments.clone(), subject).at(self.clock.now());

        let session_id = self.with_inner(|inner| {
            let session_id = inner.identity.get_or_create();
            inner.messages.push(user_message.clone());
            inner.history.append(&user_message);
            if !inner.study.increment_message_count() {
                if let Some(subject) = subject {
                    inner.study.start(Some(subject));
                }
            }
            session_id
        });
        observer.on_user_message(&user_message);

        let request = OutboundRequest::new(draft.text, session_id, subject, &draft.attachments);
        tracing::debug!(
            transport = self.transport.name(),
            subject = subject.map_or("none", Subject::name),
            attachments = draft.attachments.len(),
            "Sending message"
        );

        let mut body = match self.transport.send(request).await {
            Ok(body) => body,
            Err(e) => return self.fail(e, observer).await,
        };

        let reply = Message::assistant("").at(self.clock.now());
        let message_id = reply.id;
        self.with_inner(|inner| inner.messages.push(reply));
        guard.set(SendState::Streaming { message_id });

        let mut decoder = StreamDecoder::new();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    let updates = decoder.push(&bytes);
                    self.apply_updates(message_id, &decoder, &updates, observer);
                    if decoder.is_ended() {
                        break;
                    }
                }
                Err(e) => {
                    // A body that fails mid-stream is a transport failure; the partial reply goes.
                    self.with_inner(|inner| inner.messages.retain(|m| m.id != message_id));
                    return self.fail(e, observer).await;
                }
            }
        }
        let updates = decoder.finish();
        self.apply_updates(message_id, &decoder, &updates, observer);

        let decoded = decoder.into_decoded();
        tracing::debug!(
            lines = decoded.stats.lines,
            items = decoded.stats.items,
            malformed = decoded.stats.malformed_lines,
            ended = decoded.ended,
            "Response decoded"
        );
        let text = if decoded.text.is_empty() {
            DECODE_FALLBACK_MESSAGE.to_string()
        } else {
            decoded.text
        };

        let settled = self.with_inner(|inner| {
            let message = match inner.messages.iter_mut().find(|m| m.id == message_id) {
                Some(message) => {
                    message.text = text.clone();
                    message.clone()
                }
                // The conversation was reset mid-send; the reply still goes to history.
                None => {
                    let mut message = Message::assistant(text.clone()).at(self.clock.now());
                    message.id = message_id;
                    message
                }
            };
            inner.history.append(&message);
            message
        });
        guard.set(SendState::Settled);

        self.speak(&settled.text);
        observer.on_settled(&settled);
        SendOutcome::Replied(settled)
    }

    fn apply_updates(
        &self,
        message_id: Uuid,
        decoder: &StreamDecoder,
        updates: &[DecodeUpdate],
        observer: &mut dyn ConversationObserver,
    ) {
        if !updates.iter().any(|u| matches!(u, DecodeUpdate::Delta(_))) {
            return;
        }
        let updated = self.with_inner(|inner| {
            inner
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .map(|message| {
                    message.text = decoder.text().to_string();
                    message.clone()
                })
        });
        if let Some(message) = updated {
            observer.on_stream_update(&message);
        }
    }

    async fn fail(
        &self,
        error: StudyChatError,
        observer: &mut dyn ConversationObserver,
    ) -> SendOutcome {
        tracing::warn!("Error sending message: {}", error);
        tokio::time::sleep(Duration::from_millis(self.settings.conversation.failure_delay_ms)).await;

        let apology = Message::assistant(APOLOGY_MESSAGE).at(self.clock.now());
        self.with_inner(|inner| {
            inner.messages.push(apology.clone());
            inner.history.append(&apology);
        });

        self.speak(&apology.text);
        observer.on_failure(&error, &apology);
        SendOutcome::Failed(apology)
    }

    fn speak(&self, text: &str) {
        if !self.settings.conversation.auto_speak || text.trim().is_empty() {
            return;
        }
        if let Some(speech) = &self.speech {
            speech.speak(text);
        }
    }

    /// The in-memory conversation, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.with_inner(|inner| inner.messages.clone())
    }

    pub fn session_id(&self) -> String {
        self.with_inner(|inner| inner.identity.get_or_create())
    }

    /// Start over with a fresh session identifier and an empty conversation.
    ///
    /// Durable history and the study log are left alone.
    pub fn reset_session(&self) -> String {
        self.with_inner(|inner| {
            let session_id = inner.identity.reset();
            inner.messages = vec![Message::assistant(RESET_MESSAGE).at(self.clock.now())];
            session_id
        })
    }

    /// Durable history, newest first
    pub fn history(&self) -> Vec<Message> {
        self.with_inner(|inner| inner.history.entries().to_vec())
    }

    /// The `n` newest history entries
    pub fn recent_history(&self, n: usize) -> Vec<Message> {
        self.with_inner(|inner| inner.history.recent(n).to_vec())
    }

    pub fn search_history(&self, query: &str) -> Vec<Message> {
        self.with_inner(|inner| inner.history.search(query).into_iter().cloned().collect())
    }

    pub fn clear_history(&self) {
        self.with_inner(|inner| inner.history.clear());
    }

    /// Start a study session, ending any that is running
    pub fn start_study(&self, subject: Option<Subject>) -> StudySession {
        self.with_inner(|inner| inner.study.start(subject).clone())
    }

    /// End the running study session, if any
    pub fn end_study(&self) -> Option<StudySession> {
        self.with_inner(|inner| inner.study.end())
    }

    pub fn active_study(&self) -> Option<StudySession> {
        self.with_inner(|inner| inner.study.active().cloned())
    }

    /// Seconds on the study timer
    pub fn elapsed_secs(&self) -> u64 {
        self.with_inner(|inner| inner.study.elapsed_secs())
    }

    pub fn study_sessions(&self) -> Vec<StudySession> {
        self.with_inner(|inner| inner.study.sessions().to_vec())
    }

    pub fn study_stats(&self) -> StudyStats {
        self.with_inner(|inner| inner.study.stats())
    }

    /// Capture everything an export needs
    pub fn export_snapshot(&self) -> ExportSnapshot {
        let exported_at = self.clock.now().with_timezone(&Local);
        self.with_inner(|inner| ExportSnapshot {
            messages: inner.messages.clone(),
            study_sessions: inner.study.sessions().to_vec(),
            stats: inner.study.stats(),
            session_id: inner.identity.get_or_create(),
            exported_at,
        })
    }

    /// Render the conversation in the given format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export::render(format, &self.export_snapshot())
    }

    /// Transcript for the share capability
    pub fn share_text(&self) -> String {
        self.with_inner(|inner| export::share_text(&inner.messages))
    }

    /// Stop background work before the process exits
    pub fn shutdown(&self) {
        self.with_inner(|inner| inner.study.shutdown());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockTransport, ScriptedReply};
    use crate::speech::RecordingSpeech;
    use crate::storage::{MemoryStorage, HISTORY_KEY, SESSION_ID_KEY};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.conversation.failure_delay_ms = 1000;
        settings
    }

    fn controller(transport: MockTransport) -> ConversationController {
        ConversationController::builder(settings())
            .with_storage(Arc::new(MemoryStorage::new()))
            .with_transport(Arc::new(transport))
            .build()
            .unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        users: usize,
        updates: Vec<String>,
        settled: Vec<String>,
        failures: usize,
    }

    impl ConversationObserver for Recorder {
        fn on_user_message(&mut self, _message: &Message) {
            self.users += 1;
        }

        fn on_stream_update(&mut self, message: &Message) {
            self.updates.push(message.text.clone());
        }

        fn on_settled(&mut self, message: &Message) {
            self.settled.push(message.text.clone());
        }

        fn on_failure(&mut self, _error: &StudyChatError, _apology: &Message) {
            self.failures += 1;
        }
    }

    #[test]
    fn test_draft_display_text() {
        let attachment = Attachment {
            id: "file_1_0".into(),
            name: "a.txt".into(),
            size: 1,
            mime_type: "text/plain".into(),
            data_url: "data:text/plain;base64,YQ==".into(),
        };
        let draft = Draft::new("  ").with_attachments(vec![attachment.clone(), attachment]);
        assert!(!draft.is_empty());
        assert_eq!(draft.display_text(), "📎 Sent 2 file(s)");
        assert!(Draft::new(" \n").is_empty());
    }

    #[test]
    fn test_build_seeds_welcome_and_identity() {
        let storage = Arc::new(MemoryStorage::new());
        let controller = ConversationController::builder(settings())
            .with_storage(storage.clone())
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();

        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, WELCOME_MESSAGE);
        assert!(controller.history().is_empty());

        let stored = storage.load(SESSION_ID_KEY).unwrap().unwrap();
        assert_eq!(stored, controller.session_id());
    }

    #[tokio::test]
    async fn test_empty_draft_is_suppressed() {
        let transport = MockTransport::new();
        let controller = controller(transport.clone());

        let outcome = controller.send_message(Draft::new("   "), &mut NoopObserver).await;
        assert!(matches!(outcome, SendOutcome::Suppressed(SuppressReason::EmptyDraft)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_send_streams_and_settles() {
        let transport = MockTransport::new().with_reply(ScriptedReply::items(&["Hel", "lo"]));
        let controller = controller(transport.clone());
        let mut recorder = Recorder::default();

        let outcome = controller
            .send_message(Draft::new("Help with algebra"), &mut recorder)
            .await;

        let SendOutcome::Replied(reply) = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(reply.text, "Hello");
        assert_eq!(recorder.users, 1);
        assert_eq!(recorder.updates, vec!["Hel", "Hello"]);
        assert_eq!(recorder.settled, vec!["Hello"]);
        assert_eq!(controller.send_state(), SendState::Idle);

        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].subject, Some(Subject::Mathematics));
        assert_eq!(messages[2].text, "Hello");

        let history = controller.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "Hello");
        assert_eq!(history[1].text, "Help with algebra");

        let request = transport.last_request().unwrap();
        assert_eq!(request.chat_input, "Help with algebra");
        assert_eq!(request.subject, Some(Subject::Mathematics));
        assert_eq!(request.session_id, controller.session_id());
    }

    #[tokio::test]
    async fn test_each_chunk_updates_message() {
        let transport = MockTransport::new().with_reply(ScriptedReply::Body(vec![
            "{\"type\":\"item\",\"content\":\"A\"}\n".to_string(),
            "{\"type\":\"item\",\"content\":\"B\"}\n".to_string(),
            "{\"type\":\"end\"}\n".to_string(),
        ]));
        let controller = controller(transport);
        let mut recorder = Recorder::default();

        controller.send_message(Draft::new("hi"), &mut recorder).await;
        assert_eq!(recorder.updates, vec!["A", "AB"]);
    }

    #[tokio::test]
    async fn test_explicit_subject_wins() {
        let transport = MockTransport::new();
        let controller = controller(transport.clone());

        controller
            .send_message(
                Draft::new("algebra question").with_subject(Some(Subject::Art)),
                &mut NoopObserver,
            )
            .await;

        assert_eq!(transport.last_request().unwrap().subject, Some(Subject::Art));
        assert_eq!(controller.active_study().unwrap().subject, Some(Subject::Art));
    }

    #[tokio::test]
    async fn test_subject_auto_starts_study() {
        let controller = controller(MockTransport::new());

        controller.send_message(Draft::new("hello there"), &mut NoopObserver).await;
        assert!(controller.active_study().is_none());

        controller
            .send_message(Draft::new("a poem about rain"), &mut NoopObserver)
            .await;
        let active = controller.active_study().unwrap();
        assert_eq!(active.subject, Some(Subject::English));
        assert_eq!(active.message_count, 0);

        controller.send_message(Draft::new("and another"), &mut NoopObserver).await;
        assert_eq!(controller.active_study().unwrap().message_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_appends_apology_after_delay() {
        let transport = MockTransport::new().with_reply(ScriptedReply::Status(500, "boom".into()));
        let controller = controller(transport.clone());
        let mut recorder = Recorder::default();

        let started = tokio::time::Instant::now();
        let outcome = controller.send_message(Draft::new("hi"), &mut recorder).await;

        assert!(started.elapsed() >= Duration::from_millis(1000));
        let SendOutcome::Failed(apology) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(apology.text, APOLOGY_MESSAGE);
        assert_eq!(recorder.failures, 1);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(controller.history()[0].text, APOLOGY_MESSAGE);
        assert_eq!(controller.send_state(), SendState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_send_is_suppressed_while_in_flight() {
        let transport = MockTransport::new().with_latency(Duration::from_millis(200));
        let controller = controller(transport.clone());
        let (mut first_observer, mut second_observer) = (NoopObserver, NoopObserver);

        let (first, second) = tokio::join!(
            controller.send_message(Draft::new("one"), &mut first_observer),
            controller.send_message(Draft::new("two"), &mut second_observer),
        );

        assert!(matches!(first, SendOutcome::Replied(_)));
        assert!(matches!(second, SendOutcome::Suppressed(SuppressReason::SendInFlight)));
        assert_eq!(transport.call_count(), 1);

        // Settled sends release the controller.
        let third = controller.send_message(Draft::new("three"), &mut NoopObserver).await;
        assert!(matches!(third, SendOutcome::Replied(_)));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_failing_mid_stream_becomes_apology() {
        let transport = MockTransport::new().with_reply(ScriptedReply::BrokenBody(vec![
            "{\"type\":\"begin\"}\n".to_string(),
            "{\"type\":\"item\",\"content\":\"Hel\"}\n".to_string(),
        ]));
        let controller = controller(transport);
        let mut recorder = Recorder::default();

        let outcome = controller.send_message(Draft::new("hi"), &mut recorder).await;
        let SendOutcome::Failed(apology) = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(apology.text, APOLOGY_MESSAGE);
        assert_eq!(recorder.updates, vec!["Hel"]);
        assert_eq!(recorder.failures, 1);
        assert!(recorder.settled.is_empty());

        // The half-streamed reply is gone; no raw protocol text survives anywhere.
        let texts: Vec<String> = controller.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec![WELCOME_MESSAGE, "hi", APOLOGY_MESSAGE]);
        let history = controller.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, APOLOGY_MESSAGE);
        assert!(history.iter().all(|m| !m.text.contains("\"type\"")));
        assert!(!controller.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_empty_body_becomes_apology() {
        let transport = MockTransport::new().with_reply(ScriptedReply::BrokenBody(vec![]));
        let controller = controller(transport);

        let outcome = controller.send_message(Draft::new("hi"), &mut NoopObserver).await;
        assert!(matches!(outcome, SendOutcome::Failed(_)));
        assert_eq!(controller.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_reply_is_never_blank() {
        let transport = MockTransport::new().with_reply(ScriptedReply::items(&[]));
        let controller = controller(transport);

        let SendOutcome::Replied(reply) =
            controller.send_message(Draft::new("hi"), &mut NoopObserver).await
        else {
            panic!("expected a reply");
        };
        assert_eq!(reply.text, DECODE_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_attachment_only_draft() {
        let transport = MockTransport::new();
        let controller = controller(transport.clone());
        let attachment = crate::attachment::AttachmentEncoder::default()
            .encode_bytes(0, "notes.txt", None, b"abc")
            .unwrap();

        controller
            .send_message(Draft::new("").with_attachments(vec![attachment]), &mut NoopObserver)
            .await;

        assert_eq!(controller.messages()[1].text, "📎 Sent 1 file(s)");
        let request = transport.last_request().unwrap();
        assert_eq!(request.chat_input, "");
        assert_eq!(request.attachment.unwrap().name, "notes.txt");
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let controller = controller(MockTransport::new());
        controller.send_message(Draft::new("hi"), &mut NoopObserver).await;
        let before = controller.session_id();

        let after = controller.reset_session();

        assert_ne!(before, after);
        assert_eq!(controller.session_id(), after);
        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, RESET_MESSAGE);
        assert_eq!(controller.history().len(), 2);
    }

    #[tokio::test]
    async fn test_auto_speak() {
        let speech = RecordingSpeech::new();
        let mut settings = settings();
        settings.conversation.auto_speak = true;
        let controller = ConversationController::builder(settings)
            .with_storage(Arc::new(MemoryStorage::new()))
            .with_transport(Arc::new(
                MockTransport::new().with_reply(ScriptedReply::items(&["Spoken"])),
            ))
            .with_speech(Arc::new(speech.clone()))
            .build()
            .unwrap();

        controller.send_message(Draft::new("hi"), &mut NoopObserver).await;
        assert_eq!(speech.spoken(), vec!["Spoken"]);
    }

    #[tokio::test]
    async fn test_speech_off_by_default() {
        let speech = RecordingSpeech::new();
        let controller = ConversationController::builder(settings())
            .with_storage(Arc::new(MemoryStorage::new()))
            .with_transport(Arc::new(MockTransport::new()))
            .with_speech(Arc::new(speech.clone()))
            .build()
            .unwrap();

        controller.send_message(Draft::new("hi"), &mut NoopObserver).await;
        assert!(speech.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_clear_history() {
        let storage = Arc::new(MemoryStorage::new());
        let controller = ConversationController::builder(settings())
            .with_storage(storage.clone())
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();

        controller.send_message(Draft::new("hi"), &mut NoopObserver).await;
        controller.clear_history();

        assert!(controller.history().is_empty());
        assert!(storage.load(HISTORY_KEY).unwrap().is_none());
        assert_eq!(controller.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_export_includes_conversation() {
        let controller = controller(MockTransport::new().with_reply(ScriptedReply::items(&["Yes"])));
        controller.send_message(Draft::new("Is this exported?"), &mut NoopObserver).await;

        let text = controller.export(ExportFormat::Text).unwrap();
        assert!(text.contains("Is this exported?"));
        assert!(text.contains(WELCOME_MESSAGE));
        assert!(controller.share_text().ends_with("You: Is this exported?\n\nAssistant: Yes"));
    }
}
