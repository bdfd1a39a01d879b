// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studychat::attachment::AttachmentEncoder;
use studychat::chat::{
    ConversationController, ConversationObserver, Draft, Message, SendOutcome,
    DECODE_FALLBACK_MESSAGE,
};
use studychat::config::Settings;
use studychat::storage::MemoryStorage;
use studychat::subject::Subject;

#[derive(Default)]
struct Transcript {
    updates: Vec<String>,
    settled: Option<String>,
}

impl ConversationObserver for Transcript {
    fn on_stream_update(&mut self, message: &Message) {
        self.updates.push(message.text.clone());
    }

    fn on_settled(&mut self, message: &Message) {
        self.settled = Some(message.text.clone());
    }
}

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.remote.chat_url = format!("{}/webhook/chat", server.uri());
    settings.remote.attachment_url = format!("{}/webhook/attachment", server.uri());
    settings.conversation.failure_delay_ms = 0;
    settings
}

fn controller_for(server: &MockServer) -> ConversationController {
    ConversationController::builder(settings_for(server))
        .with_storage(Arc::new(MemoryStorage::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_streamed_reply_over_http() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"type\":\"begin\"}\n",
        "{\"type\":\"item\",\"content\":\"An atom is \"}\n",
        "{\"type\":\"item\",\"content\":\"tiny.\"}\n",
        "{\"type\":\"end\"}\n",
    );
    Mock::given(method("GET"))
        .and(path("/webhook/chat"))
        .and(query_param("chatInput", "What is an atom?"))
        .and(query_param("subject", "Science"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let chat = controller_for(&server);
    let mut transcript = Transcript::default();
    let outcome = chat
        .send_message(Draft::new("What is an atom?"), &mut transcript)
        .await;

    let SendOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, "An atom is tiny.");
    assert_eq!(transcript.settled.as_deref(), Some("An atom is tiny."));
    assert_eq!(transcript.updates.last().map(String::as_str), Some("An atom is tiny."));
    assert_eq!(chat.active_study().unwrap().subject, Some(Subject::Science));
}

#[tokio::test]
async fn test_server_error_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhook/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let chat = controller_for(&server);
    let outcome = chat
        .send_message(Draft::new("Hello"), &mut Transcript::default())
        .await;
    assert!(matches!(outcome, SendOutcome::Failed(_)));
    assert!(!chat.is_busy());
}

#[tokio::test]
async fn test_reply_without_items_gets_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhook/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("{\"type\":\"begin\"}\n{\"type\":\"end\"}\n"),
        )
        .mount(&server)
        .await;

    let chat = controller_for(&server);
    let outcome = chat
        .send_message(Draft::new("Hello"), &mut Transcript::default())
        .await;
    let SendOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, DECODE_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_attachment_routes_to_attachment_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhook/attachment"))
        .and(query_param("file_title", "notes.txt"))
        .and(query_param("file_type", "text/plain"))
        .and(query_param("chatInput", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"type\":\"item\",\"content\":\"Got your notes.\"}\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "photosynthesis happens in leaves").unwrap();
    let batch = AttachmentEncoder::new(1024).encode_batch(&[file]);
    assert!(batch.rejections.is_empty());

    let chat = controller_for(&server);
    let outcome = chat
        .send_message(
            Draft::new("").with_attachments(batch.attachments),
            &mut Transcript::default(),
        )
        .await;
    let SendOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert_eq!(reply.text, "Got your notes.");

    let messages = chat.messages();
    assert_eq!(messages[1].text, "📎 Sent 1 file(s)");
    assert_eq!(messages[1].attachments.len(), 1);
}
