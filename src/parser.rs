//! Incremental parser for streamed LLM responses.
//!
//! Consumes response fragments as they arrive and emits, as soon as safely
//! possible, a mood event, complete speakable sentences, and — once the
//! stream ends — the trailing command tag, if any.
//!
//! Speaking is optimistic: each complete sentence is released the moment
//! its boundary arrives. Any candidate that still contains a bracket after
//! stray-tag stripping is held back instead, so a split tag like
//! `[CMD: sto` is never read aloud; the cost is at most one
//! sentence-boundary of extra latency.

use crate::tags::{self, CommandTag, TagScan};
use tracing::{debug, warn};

/// An event produced while parsing one turn's response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// Leading mood tag detected (lowercased identifier). At most one per turn.
    Mood(String),
    /// A complete, tag-stripped unit of text ready for synthesis.
    Speak(String),
}

/// Parser lifecycle for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Start of the response; a leading mood tag may still arrive.
    AwaitingMood,
    /// Mood resolved (found or absent); scanning for sentence boundaries.
    Streaming,
    /// Stream ended; the parser is spent.
    Drained,
}

/// Per-turn incremental response parser.
///
/// Created at turn start and discarded at turn end; never reused across
/// turns. Feed fragments with [`push`](Self::push) and close the turn with
/// [`finish`](Self::finish).
pub struct ResponseParser {
    state: ParseState,
    /// Full text seen so far; needed for the final command extraction.
    raw: String,
    /// Unconsumed suffix still to be scanned.
    pending: String,
    mood_emitted: bool,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    /// Create a parser for a new turn.
    pub fn new() -> Self {
        Self {
            state: ParseState::AwaitingMood,
            raw: String::new(),
            pending: String::new(),
            mood_emitted: false,
        }
    }

    /// Whether a mood tag has already been reported this turn.
    pub fn mood_emitted(&self) -> bool {
        self.mood_emitted
    }

    /// Full response text accumulated so far (tags included), for
    /// conversation-history recording.
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Feed one response fragment, returning the events it releases.
    pub fn push(&mut self, fragment: &str) -> Vec<ParseEvent> {
        if self.state == ParseState::Drained {
            warn!("fragment received after end-of-stream, ignoring");
            return Vec::new();
        }

        self.raw.push_str(fragment);
        self.pending.push_str(fragment);

        let mut events = Vec::new();

        if self.state == ParseState::AwaitingMood {
            match tags::leading_mood(&self.pending) {
                TagScan::Complete { identifier, end } => {
                    self.pending.drain(..end);
                    if !self.mood_emitted {
                        self.mood_emitted = true;
                        debug!(mood = %identifier, "detected mood tag");
                        events.push(ParseEvent::Mood(identifier));
                    }
                    self.state = ParseState::Streaming;
                }
                TagScan::Partial => {
                    // Might still be a tag; hold everything back.
                    return events;
                }
                TagScan::Absent => {
                    // No leading tag: the turn proceeds with the sink's
                    // default (neutral) mood.
                    self.state = ParseState::Streaming;
                }
            }
        }

        self.scan_sentences(&mut events);
        events
    }

    /// Close the turn: flush the final speakable remainder and extract the
    /// trailing command, if present.
    pub fn finish(&mut self) -> (Vec<ParseEvent>, Option<CommandTag>) {
        if self.state == ParseState::Drained {
            warn!("finish() called twice on the same turn");
            return (Vec::new(), None);
        }
        self.state = ParseState::Drained;

        let command = tags::trailing_command(&self.raw).map(|(cmd, _)| cmd);

        // Cut speakable text ahead of the command marker even when the tag
        // itself is truncated (early transport failure) so a command
        // fragment is never read aloud.
        let speakable = match tags::command_marker_offset(&self.pending) {
            Some(cut) => &self.pending[..cut],
            None => self.pending.as_str(),
        };

        let mut events = Vec::new();
        let cleaned = tags::strip_stray_tags(speakable);
        if !cleaned.is_empty() {
            events.push(ParseEvent::Speak(cleaned));
        }
        self.pending.clear();

        (events, command)
    }

    /// Emit every complete sentence currently speakable from the pending
    /// buffer, advancing past each one.
    fn scan_sentences(&mut self, events: &mut Vec<ParseEvent>) {
        while let Some((punct_end, resume)) = find_sentence_boundary(&self.pending) {
            let candidate = &self.pending[..punct_end];
            let cleaned = tags::strip_stray_tags(candidate);
            if cleaned.contains('[') {
                // A tag is still open (or un-strippable) inside this
                // candidate; wait for more fragments rather than speak
                // speculative text.
                break;
            }
            if !cleaned.is_empty() {
                events.push(ParseEvent::Speak(cleaned));
            }
            self.pending.drain(..resume);
        }
    }
}

/// Find the next sentence boundary: `.`, `!` or `?` immediately followed
/// by whitespace.
///
/// Returns `(punct_end, resume)` — the byte offset just past the
/// punctuation (the candidate is `text[..punct_end]`) and the offset just
/// past the following whitespace character (scanning resumes there).
fn find_sentence_boundary(text: &str) -> Option<(usize, usize)> {
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let after = i + c.len_utf8();
            if let Some(next) = text[after..].chars().next() {
                if next.is_whitespace() {
                    return Some((after, after + next.len_utf8()));
                }
            }
        }
    }
    None
}
