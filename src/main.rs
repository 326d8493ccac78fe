//! Lektion CLI entry point.

use anyhow::Result;
use clap::Parser;
use lektion::cli::{commands, Cli, Commands, Output};
use lektion::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        Output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Settings::default_config_path);
    let mut settings = Settings::load_from(cli.config.as_ref())?;

    if let Some(host) = &cli.host {
        settings.model.host = host.clone();
    }
    if let Some(model) = &cli.model {
        settings.model.model = model.clone();
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lektion={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        Some(Commands::Config { action }) => {
            commands::run_config(action, &config_path, settings)?;
        }

        Some(Commands::Doctor) => {
            commands::run_doctor(&config_path, &settings).await?;
        }

        Some(Commands::Turns { transcript, format }) => {
            commands::run_turns(transcript, format, &settings)?;
        }

        Some(Commands::Ask {
            transcript,
            question,
            summary_file,
        }) => {
            settings.validate()?;
            commands::run_ask(transcript, question, summary_file.as_deref(), settings).await?;
        }

        Some(Commands::Sessions { action }) => {
            settings.validate()?;
            commands::run_sessions(action, settings).await?;
        }

        None => {
            let Some(transcript) = &cli.transcript else {
                anyhow::bail!("no transcript file given (see lektion --help)");
            };
            settings.validate()?;
            commands::run_summarize(
                transcript,
                &cli.questions,
                cli.interactive,
                cli.save_summary,
                settings,
            )
            .await?;
        }
    }

    Ok(())
}
