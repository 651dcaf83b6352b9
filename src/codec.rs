//! Note body codec and filename handling.
//!
//! A note on the wire is base64 over a canonical JSON object holding `id`,
//! `content`, `timestamp`, and `created`. The filename is never part of the
//! body; it embeds the creation millisecond timestamp, which is the sort key
//! for listings and must be extractable without reading file content.

use crate::models::Note;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

// Pattern literals are compile-time constants; construction cannot fail.
#[allow(clippy::unwrap_used)]
static PLAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,16})\.json$").unwrap());

#[allow(clippy::unwrap_used)]
static PREFIXED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^note-(\d{1,16})\.json$").unwrap());

/// Filename convention for note files.
///
/// Two incompatible conventions exist across deployments; a store validates
/// strictly against exactly one of them. The pattern doubles as a
/// path-traversal guard, so acceptance is never widened to both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStyle {
    /// `{millis}.json`, e.g. `1700000000000.json`.
    #[default]
    Plain,
    /// `note-{millis}.json`, e.g. `note-1700000000000.json`.
    Prefixed,
}

impl FilenameStyle {
    /// Parses a style string; unknown values fall back to `Plain`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prefixed" | "note-prefixed" => Self::Prefixed,
            _ => Self::Plain,
        }
    }

    /// Returns the style name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Prefixed => "prefixed",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::Plain => &PLAIN_RE,
            Self::Prefixed => &PREFIXED_RE,
        }
    }

    /// Builds the filename for a note id under this convention.
    #[must_use]
    pub fn filename_for(self, millis: i64) -> String {
        match self {
            Self::Plain => format!("{millis}.json"),
            Self::Prefixed => format!("note-{millis}.json"),
        }
    }

    /// Checks a filename against this convention's pattern.
    #[must_use]
    pub fn is_valid_filename(self, name: &str) -> bool {
        self.regex().is_match(name)
    }

    /// Extracts the embedded millisecond timestamp from a filename.
    ///
    /// Returns `None` (not an error) when the name does not match: the
    /// caller uses this to filter non-note directory entries.
    #[must_use]
    pub fn parse_timestamp(self, name: &str) -> Option<i64> {
        let caps = self.regex().captures(name)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

/// Typed failure for note body decoding.
///
/// The listing engine's contract is to skip the offending note rather than
/// abort the whole page, so these never propagate out of a listing.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    /// Body is not valid base64.
    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decoded bytes are not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// JSON is invalid or missing a required field.
    #[error("invalid note json: {0}")]
    Json(#[from] serde_json::Error),
    /// The remote omitted the content field (oversized file).
    #[error("remote returned no inline content")]
    MissingContent,
}

/// The canonical persisted body. Filename deliberately absent.
#[derive(Serialize, Deserialize)]
struct NoteBody {
    id: i64,
    content: String,
    timestamp: String,
    created: String,
}

/// Serializes a note body to canonical JSON and base64-encodes it with no
/// line wrapping.
#[must_use]
pub fn encode(note: &Note) -> String {
    let body = NoteBody {
        id: note.id,
        content: note.content.clone(),
        timestamp: note.timestamp.clone(),
        created: note.created.clone(),
    };
    // Serializing a struct of strings and an integer cannot fail.
    let json = serde_json::to_vec(&body).unwrap_or_default();
    BASE64.encode(json)
}

/// Decodes a base64 note body and attaches the filename from the directory
/// entry.
///
/// The Contents API wraps base64 with embedded newlines, so ASCII whitespace
/// is stripped before decoding.
pub fn decode(content_base64: &str, filename: &str) -> Result<Note, DecodeError> {
    let compact: String = content_base64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64.decode(compact)?;
    let text = String::from_utf8(bytes)?;
    let body: NoteBody = serde_json::from_str(&text)?;
    Ok(Note {
        id: body.id,
        content: body.content,
        timestamp: body.timestamp,
        created: body.created,
        filename: Some(filename.to_string()),
    })
}
