// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Remote assistant service
//!
//! The conversation controller talks to the tutor service through the
//! [`Transport`] trait; the body it gets back is decoded by
//! [`crate::chat::streaming`].

pub mod mock;
pub mod transport;
pub mod webhook;

pub use mock::{MockTransport, ScriptedReply};
pub use transport::{AttachmentPayload, OutboundRequest, ResponseBody, Transport};
pub use webhook::WebhookTransport;
