//! Wren: voice-assistant turn controller.
//!
//! Converts an incrementally streamed LLM response, in real time, into a
//! detected mood signal, spoken audio emitted in correct reading order
//! despite out-of-order asynchronous synthesis, and at most one trailing
//! structured command.
//!
//! # Architecture
//!
//! One turn flows through channel-connected stages:
//!
//! ```text
//! token stream → ResponseParser → { mood event    → MoodSink
//!                                   speak units   → PlaybackQueue → synthesis tasks → ordered player
//!                                   end-of-stream → CommandTag    → SkillRegistry }
//! ```
//!
//! - [`tags`]: grammar for the bracketed mood / command / stray markers,
//!   with an explicit complete / partial / absent trichotomy so a
//!   half-arrived tag is never spoken as prose.
//! - [`parser`]: per-turn state machine releasing sentences as soon as
//!   they are safely speakable.
//! - [`playback`]: unordered concurrent synthesis, strictly ordered
//!   playback, per-unit failure isolation.
//! - [`turn`]: glue driving one request/response cycle end to end.
//!
//! Microphone capture, wake words, the LLM call itself, TTS engines, audio
//! devices, and avatar protocols are external collaborators behind the
//! traits in [`speech`], [`mood`], and [`skills`].

pub mod config;
pub mod conversation;
pub mod error;
pub mod mood;
pub mod parser;
pub mod playback;
pub mod skills;
pub mod speech;
pub mod tags;
pub mod turn;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use mood::MoodSink;
pub use parser::{ParseEvent, ResponseParser};
pub use playback::PlaybackQueue;
pub use skills::{Skill, SkillRegistry};
pub use speech::{AudioClip, AudioPlayer, SpeechSynthesizer};
pub use tags::CommandTag;
pub use turn::{TurnController, TurnOutcome};
