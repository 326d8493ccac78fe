//! Error types for Lektion.

use thiserror::Error;

/// Reasons a transcript could not be turned into turns.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Could not read transcript: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("Transcript is not text: {0}")]
    NotText(String),

    #[error("Text found before any speaker label (line {line})")]
    MissingSpeaker { line: usize },

    #[error("No speaker turns found in transcript")]
    NoTurns,
}

/// Library-level error type for Lektion operations.
#[derive(Error, Debug)]
pub enum LektionError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Model service unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid model response: {0}")]
    ModelResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of [`LektionError`] for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    ModelUnavailable,
    ModelResponse,
    Other,
}

impl LektionError {
    /// The taxonomy entry this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LektionError::Parse(_) => ErrorKind::Parse,
            LektionError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            LektionError::ModelResponse(_) => ErrorKind::ModelResponse,
            _ => ErrorKind::Other,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LektionError::ModelUnavailable(_))
    }
}

/// Result type alias for Lektion operations.
pub type Result<T> = std::result::Result<T, LektionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let parse: LektionError = ParseError::NoTurns.into();
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert_eq!(
            LektionError::ModelUnavailable("down".into()).kind(),
            ErrorKind::ModelUnavailable
        );
        assert_eq!(
            LektionError::ModelResponse("empty".into()).kind(),
            ErrorKind::ModelResponse
        );
        assert_eq!(LektionError::Config("bad".into()).kind(), ErrorKind::Other);
    }

    #[test]
    fn test_messages_are_single_line() {
        let err: LektionError = ParseError::MissingSpeaker { line: 3 }.into();
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.contains("line 3"));
    }
}
