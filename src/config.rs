//! Configuration types for the turn controller.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Mood tag vocabulary settings.
    pub mood: MoodConfig,
    /// Conversation history retention settings.
    pub conversation: ConversationConfig,
}

/// Mood vocabulary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Closed vocabulary of mood identifiers the avatar understands.
    ///
    /// Matching is case-insensitive; identifiers outside the vocabulary are
    /// tolerated (model drift) and left to the sink to ignore.
    pub vocabulary: Vec<String>,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            vocabulary: vec![
                "neutral".to_owned(),
                "tsun_annoyed".to_owned(),
                "tsun_soft".to_owned(),
                "embarrassed".to_owned(),
                "proud".to_owned(),
            ],
        }
    }
}

/// Conversation history retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Entry count above which the history is truncated.
    pub max_entries: usize,
    /// Number of most recent entries kept (plus the system entry) when
    /// truncation runs.
    pub keep_recent_entries: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_entries: 20,
            keep_recent_entries: 10,
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AssistantConfig::default();
        assert!(!config.mood.vocabulary.is_empty());
        assert!(config.conversation.max_entries > config.conversation.keep_recent_entries);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AssistantConfig::default();
        config.mood.vocabulary = vec!["calm".to_owned(), "stormy".to_owned()];
        config.conversation.max_entries = 40;
        config.save_to_file(&path).unwrap();

        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.mood.vocabulary, config.mood.vocabulary);
        assert_eq!(loaded.conversation.max_entries, 40);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AssistantConfig = toml::from_str("[conversation]\nmax_entries = 8\n").unwrap();
        assert_eq!(config.conversation.max_entries, 8);
        assert_eq!(config.conversation.keep_recent_entries, 10);
        assert_eq!(config.mood.vocabulary, MoodConfig::default().vocabulary);
    }

    #[test]
    fn from_file_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AssistantConfig::from_file(&dir.path().join("nope.toml")).is_err());
    }
}
