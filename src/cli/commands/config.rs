//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command. `config_path` is the file in effect (`--config` or
/// the default location).
pub fn run_config(action: &ConfigAction, config_path: &Path, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
            }

            Settings::default().save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Created default config at {}", config_path.display()));
        }
    }

    Ok(())
}
