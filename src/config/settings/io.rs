// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::Settings;

impl Settings {
    /// Get the default settings file path.
    pub fn default_path() -> PathBuf {
        Self::studychat_home().join("settings.json")
    }

    /// Load settings from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from a specific path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the studychat home directory (~/.studychat or $STUDYCHAT_HOME).
    pub fn studychat_home() -> PathBuf {
        if let Ok(home) = std::env::var("STUDYCHAT_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".studychat")
    }

    /// Get the directory holding the durable conversation data.
    pub fn data_dir() -> PathBuf {
        Self::studychat_home().join("data")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories() -> Result<()> {
        for dir in [Self::studychat_home(), Self::data_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // Priority: env var > config file.
        if let Ok(url) = std::env::var("STUDYCHAT_CHAT_URL") {
            self.remote.chat_url = url;
        }
        if let Ok(url) = std::env::var("STUDYCHAT_ATTACHMENT_URL") {
            self.remote.attachment_url = url;
        }
    }
}
