//! Line-oriented transcript parser.
//!
//! A turn starts at a line holding only a speaker label, optionally followed
//! by a colon:
//!
//! ```text
//! TEACHER:
//! Hello class.
//!
//! SPEAKER_01:
//! Hi teacher.
//! ```
//!
//! Recognized labels are a closed set: the literal `TEACHER`, `SPEAKER_`
//! followed by ASCII digits, and any literal labels configured in
//! `parser.extra_labels`. Every other line is dialogue and belongs to the
//! current turn, even when it looks label-like (e.g. `STUDENT:` when not
//! configured).
//!
//! Within a turn, lines are trimmed, blank lines dropped, and the rest joined
//! with single spaces. A label followed directly by another label yields no
//! turn. Text before the first label is rejected.

use super::{Transcript, Turn};
use crate::config::ParserSettings;
use crate::error::ParseError;
use regex::Regex;
use std::path::Path;
use tracing::{debug, instrument};

/// Parser turning raw transcript text into a [`Transcript`].
pub struct TranscriptParser {
    label_regex: Regex,
    extra_labels: Vec<String>,
}

impl TranscriptParser {
    pub fn new() -> Self {
        let label_regex =
            Regex::new(r"^(TEACHER|SPEAKER_[0-9]+)\s*:?$").expect("Invalid regex");

        Self {
            label_regex,
            extra_labels: Vec::new(),
        }
    }

    /// Accept additional literal speaker labels.
    pub fn with_extra_labels(mut self, labels: &[String]) -> Self {
        self.extra_labels = labels
            .iter()
            .map(|l| l.trim().trim_end_matches(':').trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    /// Create a parser from configuration.
    pub fn from_settings(settings: &ParserSettings) -> Self {
        Self::new().with_extra_labels(&settings.extra_labels)
    }

    /// Return the speaker if `line` is a label line.
    pub fn speaker_label<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim();
        if let Some(caps) = self.label_regex.captures(line) {
            return caps.get(1).map(|m| m.as_str());
        }

        let bare = line.strip_suffix(':').unwrap_or(line).trim_end();
        self.extra_labels
            .iter()
            .any(|l| l == bare)
            .then_some(bare)
    }

    /// Parse a transcript file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> Result<Transcript, ParseError> {
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes)
    }

    /// Parse raw bytes, rejecting content that is not UTF-8 text.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Transcript, ParseError> {
        if bytes.contains(&0) {
            return Err(ParseError::NotText("contains NUL bytes".to_string()));
        }
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ParseError::NotText(format!("invalid UTF-8 at byte {}", e.valid_up_to()))
        })?;
        self.parse_str(text)
    }

    /// Parse transcript text.
    pub fn parse_str(&self, text: &str) -> Result<Transcript, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Ok(Transcript::default());
        }

        let mut turns = Vec::new();
        let mut current: Option<(&str, Vec<&str>)> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(speaker) = self.speaker_label(line) {
                if let Some((prev, lines)) = current.take() {
                    push_turn(&mut turns, prev, &lines);
                }
                current = Some((speaker, Vec::new()));
                continue;
            }

            match current.as_mut() {
                Some((_, lines)) => lines.push(line),
                None => return Err(ParseError::MissingSpeaker { line: index + 1 }),
            }
        }

        if let Some((prev, lines)) = current.take() {
            push_turn(&mut turns, prev, &lines);
        }

        if turns.is_empty() {
            return Err(ParseError::NoTurns);
        }

        debug!("Parsed {} turns", turns.len());
        Ok(Transcript::new(turns))
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a turn unless its text is empty.
fn push_turn(turns: &mut Vec<Turn>, speaker: &str, lines: &[&str]) {
    let text = normalize_whitespace(&lines.join(" "));
    if text.is_empty() {
        debug!("Dropping empty turn for {}", speaker);
        return;
    }
    turns.push(Turn::new(speaker, text));
}

/// Collapse runs of whitespace to single spaces.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
