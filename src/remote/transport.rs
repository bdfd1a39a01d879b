// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport trait and request types
//!
//! Defines the abstraction layer between the conversation and the wire.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::attachment::Attachment;
use crate::error::Result;
use crate::subject::Subject;

/// Raw response body, delivered in network-sized chunks
pub type ResponseBody = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Main trait for reaching the assistant service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs (e.g., "webhook", "mock")
    fn name(&self) -> &str;

    /// Issue one outbound call.
    ///
    /// Resolves once the service has accepted the request with a success
    /// status; non-success statuses and network failures are errors.
    async fn send(&self, request: OutboundRequest) -> Result<ResponseBody>;
}

/// Everything the service receives for one user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Free text typed by the user (may be empty when only files are sent)
    pub chat_input: String,
    /// Current session identifier
    pub session_id: String,
    /// Resolved subject, sent by display name
    pub subject: Option<Subject>,
    /// First attachment of the batch, if any
    pub attachment: Option<AttachmentPayload>,
}

/// The attachment fields carried on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub id: String,
    pub mime_type: String,
    pub name: String,
    pub data_url: String,
}

impl From<&Attachment> for AttachmentPayload {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id.clone(),
            mime_type: attachment.mime_type.clone(),
            name: attachment.name.clone(),
            data_url: attachment.data_url.clone(),
        }
    }
}

impl OutboundRequest {
    /// Build a request; only the first of `attachments` is transmitted.
    pub fn new(
        chat_input: impl Into<String>,
        session_id: impl Into<String>,
        subject: Option<Subject>,
        attachments: &[Attachment],
    ) -> Self {
        Self {
            chat_input: chat_input.into(),
            session_id: session_id.into(),
            subject,
            attachment: attachments.first().map(AttachmentPayload::from),
        }
    }

    /// Query parameters in the order the service expects them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("chatInput", self.chat_input.clone()),
            ("sessionId", self.session_id.clone()),
        ];
        if let Some(subject) = self.subject {
            pairs.push(("subject", subject.name().to_string()));
        }
        if let Some(attachment) = &self.attachment {
            pairs.push(("file_id", attachment.id.clone()));
            pairs.push(("file_type", attachment.mime_type.clone()));
            pairs.push(("file_title", attachment.name.clone()));
            pairs.push(("base64", attachment.data_url.clone()));
        }
        pairs
    }
}
