// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Once-per-second elapsed-time counter
//!
//! The ticker owns its background task: dropping it (or calling [`Ticker::stop`])
//! aborts the task, so a counter can never outlive the session that started it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A cancellable tick task plus its counter
#[derive(Debug)]
pub struct Ticker {
    elapsed: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `period`.
    ///
    /// Outside a tokio runtime the ticker is inert and elapsed stays zero.
    pub fn start(period: Duration) -> Self {
        let elapsed = Arc::new(AtomicU64::new(0));

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let counter = Arc::clone(&elapsed);
                Some(runtime.spawn(async move {
                    let start = tokio::time::Instant::now() + period;
                    let mut interval = tokio::time::interval_at(start, period);
                    loop {
                        interval.tick().await;
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                }))
            }
            Err(_) => {
                tracing::debug!("No async runtime; study timer will not tick");
                None
            }
        };

        Self { elapsed, handle }
    }

    /// Ticks counted so far
    pub fn elapsed(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Whether the background task is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the background task
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
