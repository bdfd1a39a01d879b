// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Line-protocol stream decoding
//!
//! The assistant service answers with newline-separated JSON records:
//!
//! ```text
//! {"type":"begin"}
//! {"type":"item","content":"Hel"}
//! {"type":"item","content":"lo"}
//! {"type":"end"}
//! ```
//!
//! `item` fragments are concatenated, `end` stops decoding, and any line that
//! is not valid JSON is kept verbatim as literal text. The decoder is fed raw
//! network chunks, so a record may arrive split across several pushes.

use serde_json::Value;

/// Incremental decoder for one response body
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes of the line currently being received
    pending: Vec<u8>,
    /// Accumulated reply text
    text: String,
    /// Whether an `end` record has been seen
    ended: bool,
    /// Counters for diagnostics
    stats: DecodeStats,
}

/// Something the decoder wants the caller to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeUpdate {
    /// Text was appended (contains just the fragment)
    Delta(String),
    /// The `end` record arrived; remaining input is ignored
    Ended,
}

/// Statistics about a decoded body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Non-blank lines examined
    pub lines: usize,
    /// `item` records applied
    pub items: usize,
    /// Lines that were not JSON and were kept as literal text
    pub malformed_lines: usize,
    /// JSON lines with an unknown or missing `type`
    pub ignored_lines: usize,
    /// Whether a `begin` record was seen
    pub saw_begin: bool,
}

/// Result of decoding a complete body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub ended: bool,
    pub stats: DecodeStats,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the `end` record has been processed
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Feed a chunk of the response body, returning updates for every
    /// complete line it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodeUpdate> {
        let mut updates = Vec::new();
        if self.ended {
            return updates;
        }

        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]).to_string();

            if let Some(update) = self.process_line(&line) {
                updates.push(update);
            }
            if self.ended {
                self.pending.clear();
                break;
            }
        }
        updates
    }

    /// Flush a trailing line that had no terminating newline.
    pub fn finish(&mut self) -> Vec<DecodeUpdate> {
        if self.ended || self.pending.is_empty() {
            self.pending.clear();
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest).to_string();
        self.process_line(&line).into_iter().collect()
    }

    /// Consume the decoder
    pub fn into_decoded(self) -> Decoded {
        Decoded {
            text: self.text,
            ended: self.ended,
            stats: self.stats,
        }
    }

    fn process_line(&mut self, line: &str) -> Option<DecodeUpdate> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.stats.lines += 1;

        let record: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse stream line, keeping it as text: {}", e);
                self.stats.malformed_lines += 1;
                self.text.push_str(line);
                return Some(DecodeUpdate::Delta(line.to_string()));
            }
        };

        match record.get("type").and_then(Value::as_str) {
            Some("begin") => {
                tracing::debug!("Stream started: {}", trimmed);
                self.stats.saw_begin = true;
                None
            }
            Some("item") => {
                let fragment = record
                    .get("content")
                    .and_then(Value::as_str)
                    .filter(|c| !c.is_empty())?;
                self.stats.items += 1;
                self.text.push_str(fragment);
                Some(DecodeUpdate::Delta(fragment.to_string()))
            }
            Some("end") => {
                tracing::debug!("Stream ended: {}", trimmed);
                self.ended = true;
                Some(DecodeUpdate::Ended)
            }
            _ => {
                self.stats.ignored_lines += 1;
                None
            }
        }
    }
}

/// Decode a complete response body in one go.
pub fn decode_body(body: &str) -> Decoded {
    let mut decoder = StreamDecoder::new();
    decoder.push(body.as_bytes());
    decoder.finish();
    decoder.into_decoded()
}
