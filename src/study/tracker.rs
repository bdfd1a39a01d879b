// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Study session state machine
//!
//! `Inactive` and `Active` are the only states. The running ticker lives
//! inside [`ActiveStudy`], so every transition out of `Active` drops it and
//! the timer cannot leak across start/end cycles.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::storage::{load_json, save_json, Storage, STUDY_SESSIONS_KEY};
use crate::study::clock::Clock;
use crate::study::session::StudySession;
use crate::study::stats::{compute_stats, StudyStats};
use crate::study::ticker::Ticker;
use crate::subject::Subject;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Current tracker state
#[derive(Debug, Default)]
pub enum StudyState {
    #[default]
    Inactive,
    Active(ActiveStudy),
}

/// A running session and the timer counting it
#[derive(Debug)]
pub struct ActiveStudy {
    session: StudySession,
    ticker: Ticker,
}

impl ActiveStudy {
    pub fn session(&self) -> &StudySession {
        &self.session
    }

    /// Seconds counted by the timer since the session started
    pub fn elapsed_secs(&self) -> u64 {
        self.ticker.elapsed()
    }
}

/// Owns the active session and the finalized session log
pub struct StudyTracker {
    state: StudyState,
    log: Vec<StudySession>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl StudyTracker {
    /// Open the tracker, re-hydrating the finalized log from storage.
    ///
    /// A session that was still active when the process last exited was
    /// never logged and is not resumed.
    pub fn open(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let log = match load_json::<Vec<StudySession>>(storage.as_ref(), STUDY_SESSIONS_KEY) {
            Ok(sessions) => sessions.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Could not load study sessions: {}", e);
                Vec::new()
            }
        };

        Self {
            state: StudyState::Inactive,
            log,
            storage,
            clock,
        }
    }

    pub fn state(&self) -> &StudyState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, StudyState::Active(_))
    }

    /// The running session, if any
    pub fn active(&self) -> Option<&StudySession> {
        match &self.state {
            StudyState::Active(active) => Some(active.session()),
            StudyState::Inactive => None,
        }
    }

    /// Timer value; zero when inactive
    pub fn elapsed_secs(&self) -> u64 {
        match &self.state {
            StudyState::Active(active) => active.elapsed_secs(),
            StudyState::Inactive => 0,
        }
    }

    /// Finalized sessions, oldest first
    pub fn sessions(&self) -> &[StudySession] {
        &self.log
    }

    /// Start a session, finalizing any session that is already running.
    pub fn start(&mut self, subject: Option<Subject>) -> &StudySession {
        if self.is_active() {
            self.end();
        }

        let session = StudySession::begin(subject, self.clock.now());
        tracing::info!(
            id = %session.id,
            subject = session.subject.map_or("none", Subject::name),
            "Study session started"
        );

        self.state = StudyState::Active(ActiveStudy {
            session,
            ticker: Ticker::start(TICK_PERIOD),
        });
        match &self.state {
            StudyState::Active(active) => &active.session,
            // Assigned just above.
            StudyState::Inactive => unreachable!(),
        }
    }

    /// Finalize the running session and append it to the log.
    ///
    /// Returns the finalized session, or `None` when nothing was running.
    pub fn end(&mut self) -> Option<StudySession> {
        let StudyState::Active(active) = std::mem::take(&mut self.state) else {
            return None;
        };
        // Dropping the ticker here aborts the timer task.
        let ActiveStudy { session, ticker } = active;
        drop(ticker);

        let finalized = session.finalize(self.clock.now());
        tracing::info!(
            id = %finalized.id,
            messages = finalized.message_count,
            duration_secs = finalized.duration_secs().unwrap_or(0),
            "Study session ended"
        );

        self.log.push(finalized.clone());
        if let Err(e) = save_json(self.storage.as_ref(), STUDY_SESSIONS_KEY, &self.log) {
            tracing::warn!("Could not save study session: {}", e);
        }
        Some(finalized)
    }

    /// Count one more message against the running session.
    ///
    /// Returns false (and does nothing) when no session is active.
    pub fn increment_message_count(&mut self) -> bool {
        match &mut self.state {
            StudyState::Active(active) => {
                active.session.message_count += 1;
                true
            }
            StudyState::Inactive => false,
        }
    }

    /// Statistics over the finalized log, bucketed by the local calendar day
    pub fn stats(&self) -> StudyStats {
        compute_stats(&self.log, &self.clock.now().with_timezone(&Local))
    }

    /// Stop the timer at process teardown without finalizing the session.
    pub fn shutdown(&mut self) {
        if let StudyState::Active(active) = &mut self.state {
            tracing::warn!(
                id = %active.session.id,
                "Study session still active at shutdown; it will not be logged"
            );
            active.ticker.stop();
        }
    }
}
