//! Ask command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session;
use anyhow::Result;
use std::path::Path;

/// Run the ask command.
pub async fn run_ask(
    transcript_path: &Path,
    question: &str,
    summary_file: Option<&Path>,
    settings: Settings,
) -> Result<()> {
    let pipeline = Pipeline::from_settings(settings)?;
    let transcript = pipeline.parse(transcript_path)?;

    let stored = summary_file.map(session::load_summary).transpose()?;

    preflight::check_model_service(&pipeline.settings().model).await?;

    let summary = match stored {
        Some(summary) => summary,
        None => {
            let spinner = Output::spinner("Summarizing transcript...");
            let summary = pipeline.summarizer().summarize(&transcript).await;
            spinner.finish_and_clear();
            summary?
        }
    };

    let engine = pipeline.query_engine(transcript, summary);

    let spinner = Output::spinner("Thinking...");
    let answer = engine.query(question).await;
    spinner.finish_and_clear();

    println!("{}", answer?);

    Ok(())
}
