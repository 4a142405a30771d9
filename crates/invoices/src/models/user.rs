//! User model and extraction-mode selection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which extractor the backend runs over email attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Pattern-matching on the user's machine-side of the service
    Local,
    /// Hosted model extraction
    Openai,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Local => "local",
            ExtractionMode::Openai => "openai",
        }
    }

    /// Parse a mode string as the backend spells it
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(ExtractionMode::Local),
            "openai" => Some(ExtractionMode::Openai),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-owned account snapshot.
///
/// Cached client-side as read-mostly state; refreshed on load and after
/// mode changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub extraction_mode: ExtractionMode,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        assert_eq!(ExtractionMode::parse("local"), Some(ExtractionMode::Local));
        assert_eq!(ExtractionMode::parse("openai"), Some(ExtractionMode::Openai));
        assert_eq!(ExtractionMode::parse("remote"), None);
        assert_eq!(ExtractionMode::Openai.as_str(), "openai");
    }

    #[test]
    fn test_user_deserialize() {
        let json = r#"{
            "id": 3,
            "email": "user@example.com",
            "name": null,
            "extraction_mode": "openai",
            "created_at": "2024-02-10T08:30:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.extraction_mode, ExtractionMode::Openai);
        assert!(user.name.is_none());
    }
}
