//! Pre-flight checks before model work.
//!
//! Confirms the model service answers and the configured model is installed
//! before parsing and summarizing, so a missing server fails fast with a hint
//! instead of after the first request times out.

use crate::cli::Output;
use crate::config::ModelSettings;
use crate::error::{LektionError, Result};
use crate::model::OllamaProbe;
use tracing::info;

/// Check the model service for the given settings.
///
/// An unreachable service is a `ModelUnavailable` error carrying setup hints.
/// A missing model is pulled when `auto_pull` is set, otherwise reported as a
/// warning and left for the first request to fail on.
pub async fn check_model_service(settings: &ModelSettings) -> Result<()> {
    let probe = OllamaProbe::from_settings(settings)?;

    let installed = match probe.has_model(&settings.model).await {
        Ok(installed) => installed,
        Err(LektionError::ModelUnavailable(reason)) => {
            return Err(LektionError::ModelUnavailable(format!(
                "{}. Install Ollama from https://ollama.com, start it with `ollama serve`, \
                 then run `ollama pull {}`",
                reason, settings.model
            )));
        }
        Err(e) => return Err(e),
    };

    if installed {
        info!("Model {} is available", settings.model);
        return Ok(());
    }

    if settings.auto_pull {
        let spinner = Output::spinner(&format!("Pulling model {}...", settings.model));
        let pulled = probe.pull_model(&settings.model).await;
        spinner.finish_and_clear();
        pulled?;
        Output::success(&format!("Pulled model {}", settings.model));
    } else {
        Output::warning(&format!(
            "Model {} is not installed. Run `ollama pull {}` or set model.auto_pull = true",
            settings.model, settings.model
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockito::Server;

    fn settings_for(host: &str, auto_pull: bool) -> ModelSettings {
        ModelSettings {
            host: host.to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 5,
            auto_pull,
            ..ModelSettings::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_has_hints() {
        let err = check_model_service(&settings_for("http://127.0.0.1:1", false))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        let msg = err.to_string();
        assert!(msg.contains("ollama serve"));
        assert!(msg.contains("ollama pull llama3.2"));
    }

    #[tokio::test]
    async fn test_installed_model_passes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":[{"name":"llama3.2:latest"}]}"#)
            .create_async()
            .await;

        check_model_service(&settings_for(&server.url(), false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_model_without_auto_pull_is_not_fatal() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":[]}"#)
            .create_async()
            .await;
        let pull = server
            .mock("POST", "/api/pull")
            .expect(0)
            .create_async()
            .await;

        check_model_service(&settings_for(&server.url(), false))
            .await
            .unwrap();
        pull.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_model_is_pulled() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":[]}"#)
            .create_async()
            .await;
        let pull = server
            .mock("POST", "/api/pull")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        check_model_service(&settings_for(&server.url(), true))
            .await
            .unwrap();
        pull.assert_async().await;
    }
}
