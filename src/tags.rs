//! Tag grammar for bracketed markers embedded in streamed response text.
//!
//! The LLM embeds two kinds of markers in its free-form replies:
//!
//! 1. **Mood tag** — `[identifier]` at the very start of the response
//!    (letters and underscores only), consumed by the avatar mood sink.
//! 2. **Command tag** — `[CMD: name, parameter]` anchored at the very end
//!    of the response, consumed by the skill registry.
//!
//! Because the response arrives as arbitrary fragments, a tag can be split
//! at any byte. Scanning therefore distinguishes *complete*, *partial*
//! (the buffer ends inside what may still become a tag), and *absent*
//! matches: a partial tag must never be treated as prose until the stream
//! has ended.

/// Outcome of scanning a buffer for a leading tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagScan {
    /// A complete tag was found. `end` is the byte offset just past the
    /// closing bracket, so the caller can strip `buffer[..end]`.
    Complete { identifier: String, end: usize },
    /// The buffer ends inside what may still become a valid tag.
    /// Wait for more data before treating it as prose.
    Partial,
    /// The buffer clearly does not start with a tag.
    Absent,
}

/// A trailing command extracted from a response: `[CMD: name, parameter]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTag {
    /// Command name (word characters).
    pub name: String,
    /// Raw parameter string (single parameter in this version).
    pub param: String,
}

/// Literal marker opening a command tag.
pub const COMMAND_MARKER: &str = "[CMD:";

fn is_mood_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan for a mood tag at the start of the buffer (leading whitespace
/// allowed). Identifiers are lowercased; the vocabulary check is the mood
/// sink's concern, not the grammar's.
///
/// A whitespace-only buffer, or one ending inside `[identifier`, is
/// [`TagScan::Partial`]: more fragments may still complete the tag.
pub fn leading_mood(buffer: &str) -> TagScan {
    let trimmed = buffer.trim_start();
    if trimmed.is_empty() {
        // Nothing decisive yet; a bracket may still arrive.
        return TagScan::Partial;
    }
    if !trimmed.starts_with('[') {
        return TagScan::Absent;
    }

    let ws_len = buffer.len() - trimmed.len();
    let inner = &trimmed[1..];
    for (i, c) in inner.char_indices() {
        if c == ']' {
            if i == 0 {
                // "[]" carries no identifier.
                return TagScan::Absent;
            }
            let identifier = inner[..i].to_lowercase();
            // End offset in the original buffer: whitespace + '[' + inner + ']'.
            return TagScan::Complete {
                identifier,
                end: ws_len + 1 + i + 1,
            };
        }
        if !is_mood_char(c) {
            // Not a mood tag (e.g. "[CMD:" or "[3..."). The streaming
            // holdback still protects any command tag from being spoken.
            return TagScan::Absent;
        }
    }
    // Open bracket with only mood characters so far and no close yet.
    TagScan::Partial
}

/// Match a trailing command tag anchored at the end of the buffer
/// (trailing whitespace allowed).
///
/// Returns the parsed command and the byte offset of the `[CMD:` marker,
/// or `None` when the buffer does not end with a well-formed tag. Only
/// meaningful once the stream has ended; mid-stream partial tags are
/// handled by the parser's bracket holdback.
pub fn trailing_command(buffer: &str) -> Option<(CommandTag, usize)> {
    let trimmed = buffer.trim_end();
    if !trimmed.ends_with(']') {
        return None;
    }
    let start = trimmed.rfind(COMMAND_MARKER)?;
    let inner = trimmed[start + COMMAND_MARKER.len()..trimmed.len() - 1].trim_start();

    let name_len = inner.chars().take_while(|&c| is_word_char(c)).count();
    if name_len == 0 {
        return None;
    }
    // Name is ASCII, so char count == byte count.
    let name = &inner[..name_len];
    let rest = &inner[name_len..];
    let param = rest.strip_prefix(',')?;

    Some((
        CommandTag {
            name: name.to_owned(),
            param: param.trim().to_owned(),
        },
        start,
    ))
}

/// Byte offset of the first command marker in the buffer, if any.
///
/// Used at end-of-stream to cut speakable text ahead of a command tag even
/// when the tag itself is malformed or truncated.
pub fn command_marker_offset(buffer: &str) -> Option<usize> {
    buffer.find(COMMAND_MARKER)
}

/// Remove every complete mood-shaped bracket tag (`[letters_]`) from the
/// text, collapsing the whitespace seam each removal leaves behind.
///
/// Anything that is not a complete mood-shaped tag (partial tags, command
/// tags, bracketed prose) is left untouched. The result is trimmed.
pub fn strip_stray_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let (before, from_bracket) = rest.split_at(open);
        out.push_str(before);

        match mood_shaped_tag_len(from_bracket) {
            Some(len) => {
                rest = &from_bracket[len..];
                // Avoid a doubled space where the tag sat between words.
                if out.ends_with(|c: char| c.is_whitespace()) || out.is_empty() {
                    rest = rest.trim_start_matches(' ');
                }
            }
            None => {
                out.push('[');
                rest = &from_bracket[1..];
            }
        }
    }
    out.push_str(rest);
    out.trim().to_owned()
}

/// Length in bytes of a complete `[letters_]` tag at the start of `s`
/// (which begins with `[`), or `None` if no such tag starts there.
fn mood_shaped_tag_len(s: &str) -> Option<usize> {
    let inner = &s[1..];
    for (i, c) in inner.char_indices() {
        if c == ']' {
            return if i > 0 { Some(1 + i + 1) } else { None };
        }
        if !is_mood_char(c) {
            return None;
        }
    }
    None
}
