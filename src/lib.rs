//! Lektion - Classroom Transcript Summaries and Q&A
//!
//! A local-first CLI tool for summarizing classroom transcripts and asking
//! questions about them with a locally hosted language model.
//!
//! # Overview
//!
//! Lektion allows you to:
//! - Parse speaker-labelled transcripts (`TEACHER`, `SPEAKER_01`, ...)
//! - Summarize a lesson, chunking transcripts that exceed the context window
//! - Ask follow-up questions grounded in the transcript and its summary
//! - Save question sessions and resume them later
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Transcript model, parser and export
//! - `model` - Language model client abstraction (Ollama)
//! - `chunking` - Turn-boundary chunking for long transcripts
//! - `summarize` - Transcript summarization
//! - `query` - Question answering
//! - `session` - Saved question sessions
//! - `pipeline` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use lektion::config::Settings;
//! use lektion::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::from_settings(Settings::load()?)?;
//!
//!     let transcript = pipeline.parse(Path::new("lesson.txt"))?;
//!     let summary = pipeline.summarizer().summarize(&transcript).await?;
//!     println!("{}", summary);
//!
//!     let engine = pipeline.query_engine(transcript, summary);
//!     println!("{}", engine.query("What was the main topic?").await?);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod session;
pub mod summarize;
pub mod transcript;

pub use error::{LektionError, Result};
