// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for studychat
//!
//! Handles loading and saving settings from ~/.studychat/settings.json

use serde::{Deserialize, Serialize};

mod io;
mod validation;

/// Main settings structure, stored in ~/.studychat/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Remote assistant endpoints
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Conversation behaviour
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Attachment limits
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

/// Remote assistant service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Webhook used for text-only messages
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Webhook used when the message carries an attachment
    #[serde(default = "default_attachment_url")]
    pub attachment_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            attachment_url: default_attachment_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Conversation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationConfig {
    /// Pause before the apology message after a failed send
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,

    /// Maximum number of entries kept in the durable history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Speak assistant replies when a speech output is available
    #[serde(default)]
    pub auto_speak: bool,

    /// Program invoked with the reply text to speak it (e.g. `espeak`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_command: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            failure_delay_ms: default_failure_delay_ms(),
            history_limit: default_history_limit(),
            auto_speak: false,
            speech_command: None,
        }
    }
}

/// Attachment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentConfig {
    /// Largest file accepted, in bytes
    #[serde(default = "default_max_attachment_bytes")]
    pub max_bytes: u64,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_attachment_bytes(),
        }
    }
}

/// 10 MiB
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Number of history entries kept unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// Default value functions
fn default_chat_url() -> String {
    "http://localhost:5678/webhook/chat".to_string()
}

fn default_attachment_url() -> String {
    "http://localhost:5678/webhook/attachment".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_failure_delay_ms() -> u64 {
    1000
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_max_attachment_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.conversation.failure_delay_ms, 1000);
        assert_eq!(settings.conversation.history_limit, 100);
        assert!(!settings.conversation.auto_speak);
        assert_eq!(settings.attachments.max_bytes, 10 * 1024 * 1024);
        assert!(settings.remote.chat_url.starts_with("http"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"remote": {"chat_url": "https://tutor.example/webhook/chat"}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.remote.chat_url, "https://tutor.example/webhook/chat");
        assert_eq!(settings.remote.attachment_url, default_attachment_url());
        assert_eq!(settings.conversation, ConversationConfig::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
