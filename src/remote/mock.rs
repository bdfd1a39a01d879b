// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock transport for testing
//!
//! Replays scripted replies without touching the network and records every
//! request it receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;

use crate::error::{ApiError, Result, StudyChatError};
use crate::remote::transport::{OutboundRequest, ResponseBody, Transport};

/// A pre-configured outcome for one call
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Success status; the body arrives in these chunks
    Body(Vec<String>),
    /// Success status, then the body fails after these chunks
    BrokenBody(Vec<String>),
    /// Non-success status
    Status(u16, String),
    /// The request never reached the service
    NetworkError(String),
}

impl ScriptedReply {
    /// Body built from `item` records, one per fragment, followed by `end`
    pub fn items(fragments: &[&str]) -> Self {
        let mut lines = vec![r#"{"type":"begin"}"#.to_string()];
        for fragment in fragments {
            lines.push(serde_json::json!({"type": "item", "content": fragment}).to_string());
        }
        lines.push(r#"{"type":"end"}"#.to_string());
        ScriptedReply::Body(lines.into_iter().map(|l| format!("{}\n", l)).collect())
    }
}

/// A scripted transport
#[derive(Clone)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    call_count: Arc<AtomicUsize>,
    recorded_requests: Arc<Mutex<Vec<OutboundRequest>>>,
    latency: Duration,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
        }
    }

    /// Queue a reply (returned in order; the last one repeats)
    pub fn with_reply(self, reply: ScriptedReply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Delay every call before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of times send() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All recorded requests
    pub fn recorded_requests(&self) -> Vec<OutboundRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// The last request made
    pub fn last_request(&self) -> Option<OutboundRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    fn next_reply(&self) -> ScriptedReply {
        let mut replies = lock(&self.replies);
        if replies.len() > 1 {
            replies.pop_front().unwrap_or_else(|| ScriptedReply::items(&["Mock response"]))
        } else {
            replies
                .front()
                .cloned()
                .unwrap_or_else(|| ScriptedReply::items(&["Mock response"]))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock transport lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn chunks(parts: Vec<String>) -> Vec<Result<Vec<u8>>> {
    parts.into_iter().map(|p| Ok(p.into_bytes())).collect()
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: OutboundRequest) -> Result<ResponseBody> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded_requests).push(request);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_reply() {
            ScriptedReply::Body(parts) => Ok(Box::pin(stream::iter(chunks(parts)))),
            ScriptedReply::BrokenBody(parts) => {
                let mut items = chunks(parts);
                items.push(Err(StudyChatError::Api(ApiError::StreamError(
                    "connection reset".to_string(),
                ))));
                Ok(Box::pin(stream::iter(items)))
            }
            ScriptedReply::Status(status, message) => {
                Err(StudyChatError::Api(ApiError::ServerError { status, message }))
            }
            ScriptedReply::NetworkError(message) => {
                Err(StudyChatError::Api(ApiError::Network(message)))
            }
        }
    }
}
