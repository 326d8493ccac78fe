//! Transcript parsing and representation.

mod format;
mod models;
mod parser;

pub use format::{format_transcript, OutputFormat, TranscriptExport, TurnExport};
pub use models::{Transcript, Turn, TEACHER_LABEL};
pub use parser::TranscriptParser;
