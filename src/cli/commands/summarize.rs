//! Default command: summarize a transcript, then answer questions about it.

use super::chat::run_question_loop;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session::{self, Session, SessionStore};
use anyhow::Result;
use std::path::Path;

/// Run the summarize command.
pub async fn run_summarize(
    transcript_path: &Path,
    questions: &[String],
    interactive: bool,
    save_summary: bool,
    settings: Settings,
) -> Result<()> {
    let pipeline = Pipeline::from_settings(settings)?;
    let transcript = pipeline.parse(transcript_path)?;
    Output::info(&format!(
        "Parsed {} turns ({} student questions)",
        transcript.len(),
        transcript.student_questions().len()
    ));

    preflight::check_model_service(&pipeline.settings().model).await?;

    let spinner = Output::spinner("Summarizing transcript...");
    let summary = pipeline.summarizer().summarize(&transcript).await;
    spinner.finish_and_clear();
    let summary = summary?;

    println!("{}", summary);

    if save_summary {
        let path = session::save_summary(
            &pipeline.settings().summaries_dir(),
            transcript_path,
            &summary,
        )?;
        Output::success(&format!("Summary saved to {}", path.display()));
    }

    if questions.is_empty() && !interactive {
        return Ok(());
    }

    // Only interactive runs are kept as sessions
    let mut session = interactive.then(|| Session::new(transcript_path, summary.clone()));
    let engine = pipeline.query_engine(transcript, summary);

    for question in questions {
        let answer = engine.query(question).await?;
        Output::exchange(question, &answer.text);
        if let Some(session) = session.as_mut() {
            session.record(question, &answer);
        }
    }

    if let Some(mut session) = session {
        let store = SessionStore::new(pipeline.settings().sessions_dir());
        run_question_loop(&engine, &mut session, &store).await?;
    }

    Ok(())
}
