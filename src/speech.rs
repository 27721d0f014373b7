//! External synthesis and playback seams.
//!
//! The core never talks to a TTS engine or an audio device directly; it
//! drives these two traits. Implementations live outside this crate
//! (HTTP TTS clients, on-device engines, `cpal` output, test mocks).

use crate::error::Result;
use async_trait::async_trait;

/// One synthesized audio artifact, scoped to exactly one playback.
///
/// The clip is dropped (and its buffer released) immediately after the
/// playback or skip of its unit, on every exit path.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// f32 audio samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Speech synthesis service: text in, one audio clip out.
///
/// Called once per submitted speak unit; calls run concurrently and may
/// fail independently (network, quota, malformed text).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize audio for one unit of text.
    async fn synthesize(&self, text: &str) -> Result<AudioClip>;
}

/// Audio output device: blocks until the clip has finished playing.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play one clip to completion.
    async fn play(&self, clip: AudioClip) -> Result<()>;
}
