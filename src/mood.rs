//! Avatar mood sink seam.
//!
//! The parser reports at most one mood identifier per turn; the sink owns
//! what happens next (avatar hotkey, orb palette, nothing at all). The
//! vocabulary policy also lives here: identifiers outside the configured
//! set are the sink's call, not a parse error.

use crate::config::MoodConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Receiver for turn-level mood notifications.
///
/// Fire-and-forget from the turn controller's perspective, but the
/// controller does not begin the next turn's capture until the call
/// returns.
#[async_trait]
pub trait MoodSink: Send + Sync {
    /// Report the mood identifier detected for this turn (lowercased).
    async fn notify_mood(&self, identifier: &str) -> Result<()>;
}

/// Mood sink that validates against the configured vocabulary and logs.
///
/// Stands in for an avatar client during development and tests: known
/// identifiers are logged at info level, unknown ones warned and ignored,
/// mirroring how an avatar client treats moods with no mapped hotkey.
pub struct LoggingMoodSink {
    vocabulary: Vec<String>,
}

impl LoggingMoodSink {
    /// Build a sink from the configured mood vocabulary.
    pub fn new(config: &MoodConfig) -> Self {
        Self {
            vocabulary: config.vocabulary.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    fn is_known(&self, identifier: &str) -> bool {
        self.vocabulary.iter().any(|m| m == identifier)
    }
}

#[async_trait]
impl MoodSink for LoggingMoodSink {
    async fn notify_mood(&self, identifier: &str) -> Result<()> {
        if self.is_known(identifier) {
            info!(mood = %identifier, "mood changed");
        } else {
            warn!(mood = %identifier, "mood not in configured vocabulary, ignoring");
        }
        Ok(())
    }
}
