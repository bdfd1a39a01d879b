// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Attachment encoding
//!
//! Files are read whole and carried as `data:` URLs. Anything above the size
//! limit is rejected outright; each file in a batch is handled on its own so
//! one bad file never sinks the rest.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::error::AttachmentRejection;
use crate::utils::format_file_size;

/// An encoded file ready to travel with a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// `file_{epochMillis}_{index}`
    pub id: String,
    /// Original file name
    pub name: String,
    /// Size of the raw payload in bytes
    pub size: u64,
    /// MIME type tag
    pub mime_type: String,
    /// `data:{mime};base64,...`
    pub data_url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Result of encoding several files at once
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub attachments: Vec<Attachment>,
    pub rejections: Vec<AttachmentRejection>,
}

/// Converts files into [`Attachment`]s, enforcing the size limit
#[derive(Debug, Clone)]
pub struct AttachmentEncoder {
    max_bytes: u64,
}

impl Default for AttachmentEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTACHMENT_BYTES)
    }
}

impl AttachmentEncoder {
    /// Create an encoder; limits above 10 MiB are lowered to 10 MiB.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes: max_bytes.min(DEFAULT_MAX_ATTACHMENT_BYTES),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check a declared size against the limit before any bytes are read.
    pub fn check_size(&self, name: &str, size: u64) -> Result<(), AttachmentRejection> {
        if size > self.max_bytes {
            return Err(AttachmentRejection::TooLarge {
                name: name.to_string(),
                size,
                limit_display: format_file_size(self.max_bytes),
            });
        }
        Ok(())
    }

    /// Encode an in-memory payload.
    ///
    /// `index` is the file's position within its batch and keeps ids unique
    /// when several files are encoded in the same millisecond.
    pub fn encode_bytes(
        &self,
        index: usize,
        name: &str,
        mime_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<Attachment, AttachmentRejection> {
        self.check_size(name, bytes.len() as u64)?;

        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime(name));
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        Ok(Attachment {
            id: format!("file_{}_{}", chrono::Utc::now().timestamp_millis(), index),
            name: name.to_string(),
            size: bytes.len() as u64,
            data_url: format!("data:{};base64,{}", mime_type, encoded),
            mime_type,
        })
    }

    /// Read and encode a file from disk.
    pub fn encode_path(&self, index: usize, path: &Path) -> Result<Attachment, AttachmentRejection> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let metadata = std::fs::metadata(path).map_err(|e| AttachmentRejection::Unreadable {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(AttachmentRejection::Unreadable {
                name,
                reason: "not a regular file".to_string(),
            });
        }
        // Gate on the declared size so oversized files are never loaded.
        self.check_size(&name, metadata.len())?;

        let bytes = std::fs::read(path).map_err(|e| AttachmentRejection::Unreadable {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        self.encode_bytes(index, &name, None, &bytes)
    }

    /// Encode every path independently, collecting rejections alongside successes.
    pub fn encode_batch(&self, paths: &[PathBuf]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, path) in paths.iter().enumerate() {
            match self.encode_path(index, path) {
                Ok(attachment) => {
                    tracing::debug!(
                        name = %attachment.name,
                        mime = %attachment.mime_type,
                        size = attachment.size,
                        "encoded attachment"
                    );
                    outcome.attachments.push(attachment);
                }
                Err(rejection) => {
                    tracing::warn!("{}", rejection);
                    outcome.rejections.push(rejection);
                }
            }
        }
        outcome
    }
}

fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}
