// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for the conversation
//!
//! Defines the messages exchanged with the remote assistant and kept in history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::subject::Subject;

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: Uuid,

    /// Message text; only grows while an assistant reply is streaming
    pub text: String,

    /// Who wrote the message
    pub author: Author,

    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// Files sent with a user message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Subject the message was tagged with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
}

/// Author of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

impl Message {
    /// Create a user message
    pub fn user(
        text: impl Into<String>,
        attachments: Vec<Attachment>,
        subject: Option<Subject>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: Author::User,
            timestamp: Utc::now(),
            attachments,
            subject,
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: Author::Assistant,
            timestamp: Utc::now(),
            attachments: Vec::new(),
            subject: None,
        }
    }

    /// Set the creation timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }

    /// Label used in transcripts
    pub fn sender_label(&self) -> &'static str {
        match self.author {
            Author::User => "You",
            Author::Assistant => "Assistant",
        }
    }
}
