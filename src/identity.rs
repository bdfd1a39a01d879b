// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session identifier management
//!
//! Every outbound request carries one process-wide token of the form
//! `session_{epochMillis}_{base36}`. The token is persisted on a best-effort
//! basis; if storage is unavailable it still lives for the rest of the process.

use std::sync::Arc;

use rand::Rng;

use crate::storage::{Storage, SESSION_ID_KEY};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 13;

/// Generates, caches and persists the session identifier
pub struct IdentityStore {
    storage: Arc<dyn Storage>,
    current: Option<String>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    /// Return the cached identifier, reading or generating it on first use.
    pub fn get_or_create(&mut self) -> String {
        if let Some(id) = self.current.as_ref().filter(|id| !id.is_empty()) {
            return id.clone();
        }

        let stored = match self.storage.load(SESSION_ID_KEY) {
            Ok(value) => value
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read session id: {}", e);
                None
            }
        };

        let id = match stored {
            Some(id) => id,
            None => {
                let id = generate_session_id();
                self.persist(&id);
                id
            }
        };

        tracing::info!("Session ID initialized: {}", id);
        self.current = Some(id.clone());
        id
    }

    /// Discard the current identifier and start a fresh one.
    pub fn reset(&mut self) -> String {
        let id = generate_session_id();
        self.persist(&id);
        tracing::info!("Session ID reset: {}", id);
        self.current = Some(id.clone());
        id
    }

    /// The identifier in use, if one has been resolved yet
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn persist(&self, id: &str) {
        if let Err(e) = self.storage.save(SESSION_ID_KEY, id) {
            tracing::warn!("Could not save session id: {}", e);
        }
    }
}

/// Build a new `session_{epochMillis}_{base36}` token.
pub fn generate_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{}", millis, suffix)
}
