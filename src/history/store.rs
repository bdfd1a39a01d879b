// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! History store implementation
//!
//! Stores message snapshots as a single JSON array under the `history` key.

use std::sync::Arc;

use crate::chat::message::Message;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::storage::{load_json, save_json, Storage, HISTORY_KEY};

/// History store for settled messages, newest first
pub struct HistoryStore {
    /// Backing storage
    storage: Arc<dyn Storage>,
    /// Maximum number of entries kept
    limit: usize,
    /// Cached entries, newest first
    entries: Vec<Message>,
}

impl HistoryStore {
    /// Open the store, loading any persisted entries.
    ///
    /// Unreadable or corrupt history is treated as empty. `limit` is held to
    /// 1..=100 and a persisted log longer than it is cut down on load.
    pub fn open(storage: Arc<dyn Storage>, limit: usize) -> Self {
        let limit = limit.clamp(1, DEFAULT_HISTORY_LIMIT);
        let mut entries = match load_json::<Vec<Message>>(storage.as_ref(), HISTORY_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Could not load history, starting empty: {}", e);
                Vec::new()
            }
        };
        entries.truncate(limit);

        Self {
            storage,
            limit,
            entries,
        }
    }

    /// Save the history array
    fn save(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), HISTORY_KEY, &self.entries) {
            tracing::warn!("Could not save history: {}", e);
        }
    }

    /// Record a message snapshot, evicting the oldest entry past the limit
    pub fn append(&mut self, message: &Message) {
        self.entries.insert(0, message.clone());
        self.entries.truncate(self.limit);
        self.save();
    }

    /// All entries, newest first
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// The `n` newest entries
    pub fn recent(&self, n: usize) -> &[Message] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Search entries by text content
    pub fn search(&self, query: &str) -> Vec<&Message> {
        let query_lower = query.to_lowercase();
        self.entries
            .iter()
            .filter(|m| m.text.to_lowercase().contains(&query_lower))
            .collect()
    }

    /// Drop every entry, in memory and on disk
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.clear(HISTORY_KEY) {
            tracing::warn!("Could not clear history: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
