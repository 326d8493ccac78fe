//! Interactive question loop.

use crate::cli::Output;
use crate::error::Result;
use crate::query::{ContextMode, QueryEngine};
use crate::session::{Session, SessionStore};
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Ask questions from stdin until `exit`, `quit` or end of input.
///
/// Every answered question is recorded in `session`, which is saved after each
/// answer so an interrupted loop keeps what was asked so far.
pub async fn run_question_loop(
    engine: &QueryEngine,
    session: &mut Session,
    store: &SessionStore,
) -> Result<()> {
    println!("\n{}", style("Questions").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the lesson, 'summary' to show the summary again, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style(">").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        if input.eq_ignore_ascii_case("summary") {
            println!("\n{}\n", engine.summary());
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = engine.query(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => {
                if answer.context == ContextMode::SummaryOnly {
                    debug!("Answered from the summary only");
                }
                println!("\n{}\n", answer);
                session.record(input, &answer);
                store.save(session)?;
            }
            Err(e) => {
                Output::error(&format!("{}", e));
            }
        }
    }

    let path = store.save(session)?;
    Output::success(&format!(
        "Session {} saved to {}",
        session.short_id(),
        path.display()
    ));

    Ok(())
}
