//! CLI module for Lektion.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{preview, Output};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lektion - Classroom Transcript Summaries and Q&A
///
/// Summarizes a speaker-labelled classroom transcript with a local language
/// model and answers questions about it.
#[derive(Parser, Debug)]
#[command(name = "lektion")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model service URL (overrides model.host)
    #[arg(long, env = "LEKTION_HOST", global = true)]
    pub host: Option<String>,

    /// Model name (overrides model.model)
    #[arg(long, env = "LEKTION_MODEL", global = true)]
    pub model: Option<String>,

    /// Transcript file to summarize
    pub transcript: Option<PathBuf>,

    /// Question to answer after the summary (repeatable)
    #[arg(short, long = "question")]
    pub questions: Vec<String>,

    /// Ask questions interactively after the summary
    #[arg(short, long)]
    pub interactive: bool,

    /// Write the summary to the summaries directory
    #[arg(long)]
    pub save_summary: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask one question about a transcript
    Ask {
        /// Transcript file
        transcript: PathBuf,

        /// The question to ask
        question: String,

        /// Use a saved summary instead of summarizing first
        #[arg(short, long)]
        summary_file: Option<PathBuf>,
    },

    /// Print the parsed speaker turns of a transcript
    Turns {
        /// Transcript file
        transcript: PathBuf,

        /// Output format (json, text)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Browse and resume saved question sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Check the model service and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// List saved sessions
    List,

    /// Show a saved session
    Show {
        /// Session id (or unique prefix) or session file path
        id: String,
    },

    /// Continue asking questions in a saved session
    Continue {
        /// Session id (or unique prefix) or session file path
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transcript_with_questions() {
        let cli = Cli::try_parse_from([
            "lektion",
            "lesson.txt",
            "-q",
            "First?",
            "--question",
            "Second?",
            "--save-summary",
        ])
        .unwrap();

        assert_eq!(cli.transcript, Some(PathBuf::from("lesson.txt")));
        assert_eq!(cli.questions, vec!["First?", "Second?"]);
        assert!(cli.save_summary);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommand() {
        let cli = Cli::try_parse_from(["lektion", "ask", "lesson.txt", "Why?"]).unwrap();
        assert!(cli.transcript.is_none());
        assert!(matches!(cli.command, Some(Commands::Ask { .. })));

        let cli = Cli::try_parse_from(["lektion", "sessions", "show", "ab12"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Sessions {
                action: SessionAction::Show { .. }
            })
        ));
    }
}
