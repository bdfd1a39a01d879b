// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! studychat - conversation and study-session engine for a study assistant.
//!
//! This crate exposes the engine used by the `studychat` terminal client
//! (`src/main.rs`).
//!
//! Architecture highlights:
//! - `chat`: message model, line-protocol stream decoder, conversation controller
//! - `remote`: transport abstraction, webhook transport and a scripted mock
//! - `study`: study session state machine, timer and statistics
//! - `storage`, `identity`, `history`: durable keyed blobs and the stores built on them
//! - `subject`, `attachment`: keyword classifier and file encoding
//! - `export`, `links`, `speech`: presentation helpers and optional capabilities

pub mod attachment;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod identity;
pub mod links;
pub mod remote;
pub mod speech;
pub mod storage;
pub mod study;
pub mod subject;
pub mod utils;

pub use error::{Result, StudyChatError};
