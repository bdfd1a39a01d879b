// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation engine
//!
//! This module provides the message model, the line-protocol stream decoder
//! and the controller that runs one send at a time against the remote service.

pub mod controller;
pub mod message;
pub mod streaming;

pub use controller::{
    ConversationBuilder, ConversationController, ConversationObserver, Draft, NoopObserver,
    SendOutcome, SendState, SuppressReason, APOLOGY_MESSAGE, DECODE_FALLBACK_MESSAGE,
    RESET_MESSAGE, WELCOME_MESSAGE,
};
pub use message::{Author, Message};
pub use streaming::{decode_body, DecodeStats, DecodeUpdate, Decoded, StreamDecoder};
