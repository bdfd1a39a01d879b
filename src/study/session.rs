// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::Subject;

/// One tracked study interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Absent while the session is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    pub message_count: u32,
    pub is_active: bool,
}

impl StudySession {
    /// A fresh, active session
    pub fn begin(subject: Option<Subject>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: None,
            subject,
            message_count: 0,
            is_active: true,
        }
    }

    /// Stamp the end time and clear the active flag
    pub fn finalize(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self.is_active = false;
        self
    }

    /// Whole seconds between start and end; `None` while active.
    ///
    /// A clock that went backwards yields zero rather than a negative span.
    pub fn duration_secs(&self) -> Option<u64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds().max(0) as u64)
    }
}
