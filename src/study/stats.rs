// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Aggregate study statistics
//!
//! Computed on demand from the finalized session log; nothing here is
//! maintained incrementally.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::study::session::StudySession;
use crate::subject::Subject;

/// Totals over all finalized sessions (all times in whole seconds)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    pub total_sessions: usize,
    pub total_time: u64,
    pub average_session_time: u64,
    pub most_studied_subject: Option<Subject>,
    pub today_time: u64,
    pub week_time: u64,
}

impl StudyStats {
    /// Display name of the most studied subject, or "None"
    pub fn most_studied_name(&self) -> &'static str {
        self.most_studied_subject.map_or("None", Subject::name)
    }
}

/// Compute statistics relative to `now`.
///
/// "Today" starts at local midnight in `now`'s time zone; "this week" is the
/// seven days before that. Buckets are chosen by session start time.
pub fn compute_stats<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> StudyStats {
    let today_start = start_of_day(now);
    let week_start = today_start - Duration::days(7);

    let mut stats = StudyStats::default();
    // Insertion order matters for the most-studied tie-break.
    let mut per_subject: Vec<(Subject, u64)> = Vec::new();

    for session in sessions {
        let Some(duration) = session.duration_secs() else {
            continue;
        };
        stats.total_sessions += 1;
        stats.total_time += duration;

        if session.start_time >= today_start {
            stats.today_time += duration;
        }
        if session.start_time >= week_start {
            stats.week_time += duration;
        }

        if let Some(subject) = session.subject {
            match per_subject.iter_mut().find(|(s, _)| *s == subject) {
                Some((_, total)) => *total += duration,
                None => per_subject.push((subject, duration)),
            }
        }
    }

    // An earlier subject keeps the lead only while strictly ahead.
    stats.most_studied_subject = per_subject
        .iter()
        .fold(None, |best: Option<(Subject, u64)>, &(subject, total)| match best {
            Some((leader, lead)) if lead > total => Some((leader, lead)),
            _ => Some((subject, total)),
        })
        .map(|(subject, _)| subject);

    if stats.total_sessions > 0 {
        stats.average_session_time = stats.total_time / stats.total_sessions as u64;
    }
    stats
}

fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
