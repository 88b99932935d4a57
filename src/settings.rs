// SPDX-License-Identifier: MPL-2.0

use crate::config::{
    APP_ID, CACHE_TTL_SECS, DEFAULT_OPENAI_API, DEFAULT_OPENAI_MODEL, DEFAULT_ORGANIZATION,
    DEFAULT_SCRAPE_MIRROR, DEFAULT_TWITTER_API,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persistent pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Organization name matched in mentions and used for the default timeline
    pub organization: String,
    pub twitter_api_base: String,
    pub twitter_bearer_token: Option<String>,
    pub scrape_mirror: String,
    pub openai_api_base: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub cache_ttl_secs: i64,
    /// Path to the tesseract executable (looked up on PATH when unset)
    pub tesseract_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            twitter_api_base: DEFAULT_TWITTER_API.to_string(),
            twitter_bearer_token: None,
            scrape_mirror: DEFAULT_SCRAPE_MIRROR.to_string(),
            openai_api_base: DEFAULT_OPENAI_API.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            cache_ttl_secs: CACHE_TTL_SECS,
            tesseract_path: None,
        }
    }
}

impl Settings {
    /// Get the settings file path (~/.config/knowyourfan/settings.json)
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location, then apply environment overrides
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_with(&path),
            None => {
                let mut settings = Self::default();
                settings.apply_env(|key| std::env::var(key).ok());
                settings
            }
        }
    }

    /// Load settings from a specific file, then apply environment overrides
    pub fn load_with(path: &Path) -> Self {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    fn load_with_env(path: &Path, var: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::load_from(path);
        settings.apply_env(var);
        settings
    }

    /// Settings file contents alone, or defaults if missing or invalid
    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), "ignoring invalid settings file: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Secrets come from the environment so they never need to live in the settings file
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var("TWITTER_BEARER_TOKEN").filter(|v| !v.is_empty()) {
            self.twitter_bearer_token = Some(token);
        }
        if let Some(key) = var("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.openai_api_key = Some(key);
        }
        if let Some(org) = var("KYF_ORGANIZATION").filter(|v| !v.is_empty()) {
            self.organization = org;
        }
    }
}
