// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Study session tracking
//!
//! A study session is an interval of active use, optionally tagged with a
//! subject. At most one is active; finalized sessions go to a durable,
//! append-only log from which statistics are computed on demand.

pub mod clock;
pub mod session;
pub mod stats;
pub mod ticker;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::StudySession;
pub use stats::{compute_stats, StudyStats};
pub use ticker::Ticker;
pub use tracker::{ActiveStudy, StudyState, StudyTracker};
