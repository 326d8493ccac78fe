//! Doctor command - verify the model service and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::model::{model_matches, OllamaProbe};
use crate::session::SessionStore;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(config_path: &Path, settings: &Settings) -> anyhow::Result<()> {
    Output::header("Lektion Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Model Service").bold());
    let service_checks = check_model_service(settings).await;
    for check in &service_checks {
        check.print();
    }
    checks.extend(service_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_data_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        anyhow::bail!("{} check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Lektion is ready to use.");
    }

    Ok(())
}

/// Check the server answers and the configured model is installed.
async fn check_model_service(settings: &Settings) -> Vec<CheckResult> {
    let model = &settings.model.model;
    let probe = match OllamaProbe::from_settings(&settings.model) {
        Ok(probe) => probe,
        Err(e) => {
            return vec![CheckResult::error(
                "Ollama",
                &e.to_string(),
                "Check model.host in the config file",
            )]
        }
    };

    match probe.list_models().await {
        Ok(models) => {
            let server = CheckResult::ok(
                "Ollama",
                &format!("{} ({} models installed)", probe.base_url(), models.len()),
            );
            let installed = models.iter().any(|m| model_matches(m, model));
            let model_check = if installed {
                CheckResult::ok("Model", model)
            } else {
                CheckResult::warning(
                    "Model",
                    &format!("{} not installed", model),
                    &format!("Run: ollama pull {} (or set model.auto_pull = true)", model),
                )
            };
            vec![server, model_check]
        }
        Err(e) => vec![CheckResult::error(
            "Ollama",
            &format!("not reachable at {} ({})", probe.base_url(), e),
            install_hint_ollama(),
        )],
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: lektion config init",
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Settings",
            &format!(
                "model {}, context window {} tokens, language {}",
                settings.model.model, settings.model.context_window, settings.general.language
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in the config file"),
    }
}

fn check_data_dir(settings: &Settings) -> CheckResult {
    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        return CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first saved session or summary",
        );
    }

    let sessions = SessionStore::new(settings.sessions_dir())
        .list()
        .map(|s| s.len())
        .unwrap_or(0);
    CheckResult::ok(
        "Data directory",
        &format!("{} ({} saved sessions)", data_dir.display(), sessions),
    )
}

/// Platform-specific install hint for Ollama.
fn install_hint_ollama() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ollama, then run: ollama serve"
    } else if cfg!(target_os = "linux") {
        "Install with: curl -fsSL https://ollama.com/install.sh | sh, then run: ollama serve"
    } else {
        "Install from: https://ollama.com/download, then run: ollama serve"
    }
}
