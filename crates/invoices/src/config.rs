//! Client settings loading
//!
//! Resolves the backend URL from (in order of priority):
//! 1. The `PENNY_API_URL` environment variable
//! 2. JSON settings file (~/.config/penny/settings.json)
//! 3. The default local development URL

use anyhow::Result;
use serde::Deserialize;

/// Settings filename in the Penny config directory
const SETTINGS_FILE: &str = "settings.json";

/// Backend URL used when nothing else is configured
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Resolved client settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
}

/// Settings file format
#[derive(Deserialize)]
struct SettingsFile {
    api_url: Option<String>,
}

impl Settings {
    /// Load settings using the documented priority order
    pub fn load() -> Result<Self> {
        if let Ok(url) = std::env::var("PENNY_API_URL") {
            if !url.is_empty() {
                return Ok(Self { api_url: url });
            }
        }

        if config::config_exists(SETTINGS_FILE) {
            let file: SettingsFile = config::load_json(SETTINGS_FILE)?;
            return Ok(Self::from_file(file));
        }

        Ok(Self::default())
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SettingsFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: SettingsFile) -> Self {
        Self {
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}
