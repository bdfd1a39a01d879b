// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP webhook transport
//!
//! Sends each message as a GET request with the fields encoded as query
//! parameters. Messages with an attachment go to a separate webhook.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::config::RemoteConfig;
use crate::error::{ApiError, Result, StudyChatError};
use crate::remote::transport::{OutboundRequest, ResponseBody, Transport};

/// Webhook-backed transport
pub struct WebhookTransport {
    client: Client,
    chat_url: String,
    attachment_url: String,
}

impl WebhookTransport {
    /// Create a transport from remote settings
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StudyChatError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            chat_url: config.chat_url.clone(),
            attachment_url: config.attachment_url.clone(),
        })
    }

    /// Create with explicit endpoints
    pub fn with_urls(chat_url: impl Into<String>, attachment_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            chat_url: chat_url.into(),
            attachment_url: attachment_url.into(),
        }
    }

    /// Endpoint a request is routed to
    pub fn endpoint_for(&self, request: &OutboundRequest) -> &str {
        if request.attachment.is_some() {
            &self.attachment_url
        } else {
            &self.chat_url
        }
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, request: OutboundRequest) -> Result<ResponseBody> {
        let url = self.endpoint_for(&request);
        tracing::debug!(
            url = %url,
            session_id = %request.session_id,
            subject = ?request.subject.map(|s| s.name()),
            has_attachment = request.attachment.is_some(),
            "sending message to webhook"
        );

        let response = self
            .client
            .get(url)
            .query(&request.query_pairs())
            .header("Accept", "text/plain")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudyChatError::Api(ApiError::ServerError {
                status: status.as_u16(),
                message: body,
            }));
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| StudyChatError::Api(ApiError::StreamError(e.to_string())))
        });
        Ok(Box::pin(body))
    }
}
