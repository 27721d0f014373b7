//! Turn controller: drives one request/response cycle.
//!
//! Feeds the streaming response through the parser, relays mood events to
//! the mood sink and sentences to the playback queue, dispatches the
//! trailing command once the stream drains, and waits for all queued audio
//! before reporting the turn complete — so the next turn's capture can
//! never start while the assistant is still speaking.

use crate::error::Result;
use crate::mood::MoodSink;
use crate::parser::{ParseEvent, ResponseParser};
use crate::playback::PlaybackQueue;
use crate::skills::{DispatchOutcome, SkillRegistry};
use crate::tags::CommandTag;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Summary of one completed turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Mood identifier reported this turn, if a leading tag was present.
    pub mood: Option<String>,
    /// Number of speak units submitted for playback.
    pub spoken_units: usize,
    /// Trailing command extracted at end-of-stream, if any.
    pub command: Option<CommandTag>,
    /// How the command was routed (None when no command was extracted).
    pub dispatch: Option<DispatchOutcome>,
    /// Full raw response text, for conversation-history recording.
    pub raw_response: String,
}

/// Drives conversational turns against a playback queue, a mood sink, and
/// a skill registry.
pub struct TurnController {
    playback: Arc<PlaybackQueue>,
    mood_sink: Arc<dyn MoodSink>,
    skills: SkillRegistry,
}

impl TurnController {
    /// Wire a controller to its collaborators.
    pub fn new(
        playback: Arc<PlaybackQueue>,
        mood_sink: Arc<dyn MoodSink>,
        skills: SkillRegistry,
    ) -> Self {
        Self {
            playback,
            mood_sink,
            skills,
        }
    }

    /// Run one turn over a streaming response.
    ///
    /// The channel yields fragments in generation order; a closed channel
    /// is end-of-stream, an `Err` item is a transport failure and flushes
    /// the turn early through the same path. Returns once the command (if
    /// any) has been dispatched and every queued unit has played or been
    /// skipped.
    ///
    /// # Errors
    ///
    /// Only infrastructure failure (the playback consumer stopping)
    /// propagates; per-unit synthesis errors and skill errors are
    /// contained and logged.
    pub async fn run_turn(
        &self,
        mut tokens: mpsc::Receiver<Result<String>>,
    ) -> Result<TurnOutcome> {
        let mut parser = ResponseParser::new();
        let mut mood = None;
        let mut spoken_units = 0usize;

        while let Some(item) = tokens.recv().await {
            match item {
                Ok(fragment) => {
                    for event in parser.push(&fragment) {
                        self.handle_event(event, &mut mood, &mut spoken_units)
                            .await;
                    }
                }
                Err(e) => {
                    // Treat as early end-of-stream: flush what is safely
                    // speakable, never a partial command.
                    warn!("response stream failed, draining turn early: {e}");
                    break;
                }
            }
        }

        let (events, command) = parser.finish();
        for event in events {
            self.handle_event(event, &mut mood, &mut spoken_units)
                .await;
        }

        let dispatch = match &command {
            Some(cmd) => {
                let outcome = self.skills.dispatch(cmd).await;
                if outcome == DispatchOutcome::Unknown {
                    warn!(command = %cmd.name, "no skill handles command");
                }
                Some(outcome)
            }
            None => None,
        };

        self.playback.wait_idle().await?;
        debug!(spoken_units, "turn complete");

        Ok(TurnOutcome {
            mood,
            spoken_units,
            command,
            dispatch,
            raw_response: parser.raw_text().to_owned(),
        })
    }

    async fn handle_event(
        &self,
        event: ParseEvent,
        mood: &mut Option<String>,
        spoken_units: &mut usize,
    ) {
        match event {
            ParseEvent::Mood(identifier) => {
                // The parser guarantees at most one of these per turn.
                if let Err(e) = self.mood_sink.notify_mood(&identifier).await {
                    warn!(mood = %identifier, "mood sink failed: {e}");
                }
                *mood = Some(identifier);
            }
            ParseEvent::Speak(text) => {
                self.playback.submit(&text);
                *spoken_units += 1;
            }
        }
    }
}
