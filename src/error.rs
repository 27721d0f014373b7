//! Error types for the turn-controller pipeline.

/// Top-level error type for the voice-assistant core.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Streaming response transport error.
    #[error("LLM stream error: {0}")]
    Llm(String),

    /// Text-to-speech synthesis error.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio playback error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Mood sink (avatar) error.
    #[error("mood sink error: {0}")]
    Mood(String),

    /// Skill execution error.
    #[error("skill error: {0}")]
    Skill(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
