//! Configuration settings for Lektion.

use crate::error::{LektionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub parser: ParserSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for saved sessions and summaries.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Language the model should answer in.
    pub language: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.lektion".to_string(),
            log_level: "warn".to_string(),
            language: "English".to_string(),
        }
    }
}

/// Local model service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the Ollama server.
    pub host: String,
    /// Model to generate with.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate. None = server default.
    pub max_tokens: Option<u32>,
    /// Input budget in (estimated) tokens.
    pub context_window: usize,
    /// Tokens of trailing turns repeated at the start of the next chunk.
    pub overlap: usize,
    /// Timeout for a single model request, in seconds.
    pub timeout_secs: u64,
    /// Attempts per request when the service is unreachable.
    pub max_attempts: u32,
    /// Pull the model automatically when the server does not have it.
    pub auto_pull: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.1,
            max_tokens: None,
            context_window: 10_000,
            overlap: 200,
            timeout_secs: 120,
            max_attempts: 1,
            auto_pull: false,
        }
    }
}

impl ModelSettings {
    /// Host without a trailing slash.
    pub fn base_url(&self) -> String {
        self.host.trim().trim_end_matches('/').to_string()
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Transcript parser settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParserSettings {
    /// Literal speaker labels accepted in addition to TEACHER and SPEAKER_NN.
    pub extra_labels: Vec<String>,
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(LektionError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LektionError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.model.base_url()).map_err(|e| {
            LektionError::Config(format!("model.host '{}' is not a URL: {}", self.model.host, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LektionError::Config(format!(
                "model.host must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.model.model.trim().is_empty() {
            return Err(LektionError::Config("model.model is empty".to_string()));
        }
        if self.model.context_window == 0 {
            return Err(LektionError::Config("model.context_window must be > 0".to_string()));
        }
        if self.model.max_attempts == 0 {
            return Err(LektionError::Config("model.max_attempts must be >= 1".to_string()));
        }
        if self.model.timeout_secs == 0 {
            return Err(LektionError::Config("model.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lektion")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory holding saved sessions.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir().join("sessions")
    }

    /// Directory holding saved summaries.
    pub fn summaries_dir(&self) -> PathBuf {
        self.data_dir().join("summaries")
    }
}
