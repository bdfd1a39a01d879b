// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Link detection in assistant replies

use regex::Regex;
use std::sync::LazyLock;

/// Full YouTube video URLs (watch, short and embed forms)
static YOUTUBE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)\S+")
        .expect("valid YouTube URL regex")
});

/// Video id patterns, tried in order
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
            .expect("valid video id regex"),
        Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("valid video id regex"),
    ]
});

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL regex"));

/// A YouTube video referenced in a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTubeLink {
    pub url: String,
    pub video_id: String,
    pub thumbnail: String,
}

/// Extract the video id from a YouTube URL
pub fn youtube_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Find every YouTube video link in `text`, in order of appearance
pub fn detect_youtube_links(text: &str) -> Vec<YouTubeLink> {
    YOUTUBE_URL_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let url = m.as_str().to_string();
            let video_id = youtube_video_id(&url)?;
            Some(YouTubeLink {
                thumbnail: format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id),
                url,
                video_id,
            })
        })
        .collect()
}

/// Every http(s) URL in `text`
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}
