//! Turns command: print the parsed speaker turns of a transcript.

use crate::config::Settings;
use crate::transcript::{format_transcript, OutputFormat, TranscriptParser};
use anyhow::Result;
use std::path::Path;

/// Run the turns command. Needs no model service.
pub fn run_turns(transcript_path: &Path, format: &str, settings: &Settings) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;

    let parser = TranscriptParser::from_settings(&settings.parser);
    let transcript = parser.parse_file(transcript_path)?;

    println!("{}", format_transcript(&transcript, format));

    Ok(())
}
