//! Sessions command: list, show and continue saved question sessions.

use super::chat::run_question_loop;
use crate::cli::{preflight, preview, Output, SessionAction};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session::SessionStore;
use anyhow::Result;
use console::style;

/// Run the sessions command.
pub async fn run_sessions(action: &SessionAction, settings: Settings) -> Result<()> {
    let store = SessionStore::new(settings.sessions_dir());

    match action {
        SessionAction::List => {
            let sessions = store.list()?;
            if sessions.is_empty() {
                Output::warning(&format!("No saved sessions in {}", store.dir().display()));
                return Ok(());
            }

            Output::header("Saved Sessions");
            for session in &sessions {
                Output::session_info(
                    &session.short_id(),
                    &session.transcript_path.display().to_string(),
                    &session.started_at.format("%Y-%m-%d %H:%M").to_string(),
                    session.exchanges.len(),
                );
            }
        }

        SessionAction::Show { id } => {
            let session = store.load(id)?;

            Output::header(&format!("Session {}", session.short_id()));
            Output::kv("Id", &session.id.to_string());
            Output::kv("Transcript", &session.transcript_path.display().to_string());
            Output::kv(
                "Started",
                &session.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );

            println!("\n{}", style("Summary").bold());
            println!("{}", session.summary);

            if session.exchanges.is_empty() {
                println!("\n{}", style("No questions asked.").dim());
            }
            for exchange in &session.exchanges {
                Output::exchange(&exchange.question, &exchange.answer);
            }
        }

        SessionAction::Continue { id } => {
            let mut session = store.load(id)?;
            let pipeline = Pipeline::from_settings(settings)?;
            let transcript = pipeline.parse(&session.transcript_path)?;

            preflight::check_model_service(&pipeline.settings().model).await?;

            Output::info(&format!(
                "Continuing session {} ({} earlier questions)",
                session.short_id(),
                session.exchanges.len()
            ));
            if let Some(last) = session.exchanges.last() {
                Output::info(&format!("Last question: {}", preview(&last.question, 80)));
            }

            let engine = pipeline.query_engine(transcript, session.summary.clone());
            run_question_loop(&engine, &mut session, &store).await?;
        }
    }

    Ok(())
}
