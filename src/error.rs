// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for studychat
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for studychat operations
#[derive(Error, Debug)]
pub enum StudyChatError {
    /// Remote service errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Attachment rejected by the encoder
    #[error("Attachment rejected: {0}")]
    Attachment(#[from] AttachmentRejection),
}

/// Errors reported by the remote assistant service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Response body failed mid-stream
    #[error("Streaming error: {0}")]
    StreamError(String),

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,
}

/// Why a single file was refused by the attachment encoder.
///
/// The display text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentRejection {
    #[error("File \"{name}\" is too large ({size} bytes). Maximum size is {limit_display}.")]
    TooLarge {
        name: String,
        size: u64,
        limit_display: String,
    },

    #[error("Error processing file \"{name}\": {reason}")]
    Unreadable { name: String, reason: String },
}

impl AttachmentRejection {
    /// Name of the file that was rejected
    pub fn file_name(&self) -> &str {
        match self {
            AttachmentRejection::TooLarge { name, .. } => name,
            AttachmentRejection::Unreadable { name, .. } => name,
        }
    }
}

/// Result type alias for studychat operations
pub type Result<T> = std::result::Result<T, StudyChatError>;

impl From<reqwest::Error> for StudyChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StudyChatError::Api(ApiError::Timeout)
        } else {
            StudyChatError::Api(ApiError::Network(err.to_string()))
        }
    }
}
