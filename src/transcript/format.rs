//! Transcript output formatting (JSON, text).

use super::Transcript;
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(format!("Unknown format: {}. Use json or text.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport<'a> {
    pub turn_count: usize,
    pub speakers: Vec<&'a str>,
    pub turns: Vec<TurnExport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TurnExport<'a> {
    pub index: usize,
    pub speaker: &'a str,
    pub text: &'a str,
}

impl<'a> From<&'a Transcript> for TranscriptExport<'a> {
    fn from(transcript: &'a Transcript) -> Self {
        Self {
            turn_count: transcript.len(),
            speakers: transcript.speakers(),
            turns: transcript
                .turns()
                .iter()
                .enumerate()
                .map(|(index, t)| TurnExport {
                    index,
                    speaker: &t.speaker,
                    text: &t.text,
                })
                .collect(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Text => transcript.full_text(),
    }
}

fn format_json(transcript: &Transcript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}
