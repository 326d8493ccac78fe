//! CLI output formatting utilities.
//!
//! Status messages go to stderr so stdout carries only summaries, answers and
//! requested data.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        eprintln!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        eprintln!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a question and its answer.
    pub fn exchange(question: &str, answer: &str) {
        println!("\n{} {}", style("Q:").cyan().bold(), style(question).bold());
        println!("{} {}", style("A:").green().bold(), answer);
    }

    /// Print a session line for listings.
    pub fn session_info(id: &str, transcript: &str, started: &str, questions: usize) {
        println!(
            "  {} {} ({}, {}, {} questions)",
            style("*").cyan(),
            style(id).bold(),
            transcript,
            style(started).dim(),
            questions
        );
    }

    /// Create a spinner on stderr.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Shorten text to `max_chars` characters, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline two", 100), "line one line two");
        assert_eq!(preview("Über die Photosynthese", 4), "Über...");
    }
}
