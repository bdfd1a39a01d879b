// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Durable message history
//!
//! A bounded newest-first log of every settled message, kept separately
//! from the in-memory conversation so it survives session resets.

pub mod store;

pub use store::HistoryStore;
