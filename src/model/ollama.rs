//! Health checks and model management through Ollama's native API.

use crate::config::ModelSettings;
use crate::error::{LektionError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Upper bound for a model download.
const PULL_TIMEOUT_SECS: u64 = 30 * 60;

/// Client for `/api/tags` and `/api/pull`.
pub struct OllamaProbe {
    http: Client,
    base_url: String,
}

impl OllamaProbe {
    /// Create a probe from model settings.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(settings.timeout()).build()?,
            base_url: settings.base_url(),
        })
    }

    /// Base URL of the probed server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List models installed on the server.
    #[instrument(skip(self), fields(host = %self.base_url))]
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| {
                LektionError::ModelUnavailable(format!(
                    "could not connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            return Err(LektionError::ModelUnavailable(format!(
                "Ollama at {} returned status {}",
                self.base_url,
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LektionError::ModelResponse(format!("malformed model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether `model` is installed. A bare name matches its `:latest` tag.
    pub async fn has_model(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|name| model_matches(name, model)))
    }

    /// Download a model and wait for completion.
    #[instrument(skip(self), fields(host = %self.base_url))]
    pub async fn pull_model(&self, model: &str) -> Result<()> {
        info!("Pulling model {}", model);

        let response = self
            .http
            .post(format!("{}/api/pull", self.base_url))
            .timeout(Duration::from_secs(PULL_TIMEOUT_SECS))
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                LektionError::ModelUnavailable(format!("could not pull {}: {}", model, e))
            })?;

        if !response.status().is_success() {
            return Err(LektionError::ModelResponse(format!(
                "failed to pull model {} (status {})",
                model,
                response.status()
            )));
        }

        let status: PullStatus = response
            .json()
            .await
            .map_err(|e| LektionError::ModelResponse(format!("malformed pull response: {}", e)))?;

        match status.error {
            Some(error) => Err(LektionError::ModelResponse(format!(
                "failed to pull model {}: {}",
                model, error
            ))),
            None => {
                info!("Pulled model {} ({})", model, status.status.unwrap_or_default());
                Ok(())
            }
        }
    }
}

/// Whether an installed model name satisfies a wanted one. A bare name matches its `:latest` tag.
pub fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted || (!wanted.contains(':') && installed == format!("{}:latest", wanted))
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullStatus {
    status: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockito::Server;

    fn probe_for(host: &str) -> OllamaProbe {
        let settings = ModelSettings {
            host: host.to_string(),
            timeout_secs: 5,
            ..ModelSettings::default()
        };
        OllamaProbe::from_settings(&settings).unwrap()
    }

    #[test]
    fn test_model_matches() {
        assert!(model_matches("llama3.2:latest", "llama3.2"));
        assert!(model_matches("llama3.2:1b", "llama3.2:1b"));
        assert!(!model_matches("llama3.2:1b", "llama3.2"));
        assert!(!model_matches("mistral:latest", "llama3.2"));
    }

    #[tokio::test]
    async fn test_list_and_has_model() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":[{"name":"llama3.2:latest","size":1},{"name":"mistral:7b"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let probe = probe_for(&server.url());
        assert_eq!(
            probe.list_models().await.unwrap(),
            vec!["llama3.2:latest".to_string(), "mistral:7b".to_string()]
        );
        assert!(probe.has_model("llama3.2").await.unwrap());
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(503)
            .create_async()
            .await;

        let err = probe_for(&server.url()).list_models().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        let err = probe_for("http://127.0.0.1:1").list_models().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_pull_model() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/pull")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        probe_for(&server.url()).pull_model("llama3.2").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pull_error_is_response_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/pull")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"pull model manifest: file does not exist"}"#)
            .create_async()
            .await;

        let err = probe_for(&server.url()).pull_model("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelResponse);
    }
}
