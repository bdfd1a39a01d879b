// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{Result, StudyChatError};

use super::{Settings, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_ATTACHMENT_BYTES};

impl Settings {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("remote.chat_url", &self.remote.chat_url),
            ("remote.attachment_url", &self.remote.attachment_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StudyChatError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }

        if !(1..=DEFAULT_HISTORY_LIMIT).contains(&self.conversation.history_limit) {
            return Err(StudyChatError::Config(format!(
                "conversation.history_limit must be between 1 and {}, got {}",
                DEFAULT_HISTORY_LIMIT, self.conversation.history_limit
            )));
        }

        if !(1..=DEFAULT_MAX_ATTACHMENT_BYTES).contains(&self.attachments.max_bytes) {
            return Err(StudyChatError::Config(format!(
                "attachments.max_bytes must be between 1 and {}, got {}",
                DEFAULT_MAX_ATTACHMENT_BYTES, self.attachments.max_bytes
            )));
        }

        Ok(())
    }
}
