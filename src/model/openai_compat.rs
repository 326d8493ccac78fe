//! Chat completions against Ollama's OpenAI-compatible endpoint.

use super::{GenerateRequest, ModelClient};
use crate::config::ModelSettings;
use crate::error::{LektionError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Ollama ignores the key, but the client requires one.
const PLACEHOLDER_API_KEY: &str = "ollama";

/// Create a chat client for `base_url` with the given request timeout.
///
/// The client's own rate-limit backoff is disabled so that
/// `generate_with_retry` is the only retry policy.
pub fn create_client(base_url: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(format!("{}/v1", base_url.trim_end_matches('/')))
        .with_api_key(PLACEHOLDER_API_KEY);

    let no_backoff = backoff::ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    };

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_backoff))
}

/// Model client backed by a local Ollama server.
pub struct OllamaClient {
    client: Client<OpenAIConfig>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a client from model settings.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        let base_url = settings.base_url();
        Ok(Self {
            client: create_client(&base_url, settings.timeout())?,
            model: settings.model.clone(),
            base_url,
            timeout: settings.timeout(),
        })
    }

    fn build_request(
        &self,
        request: &GenerateRequest,
    ) -> Result<async_openai::types::CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(|e| LektionError::InvalidInput(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(|e| LektionError::InvalidInput(e.to_string()))?
                .into(),
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(request.temperature);
        if let Some(max_tokens) = request.max_tokens {
            #[allow(deprecated)]
            args.max_tokens(max_tokens);
        }

        args.build()
            .map_err(|e| LektionError::InvalidInput(e.to_string()))
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    #[instrument(skip(self, request), fields(model = %self.model, prompt_len = request.prompt.len()))]
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let chat_request = self.build_request(request)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
            .await
            .map_err(|_| {
                LektionError::ModelUnavailable(format!(
                    "no response from {} within {}s",
                    self.base_url,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| classify_error(e, &self.base_url))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LektionError::ModelResponse("empty response from model".to_string()))?;

        debug!("Model returned {} characters", text.len());
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map client errors onto the unavailable/response taxonomy.
fn classify_error(error: OpenAIError, base_url: &str) -> LektionError {
    match error {
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            LektionError::ModelUnavailable(format!("request to {} timed out", base_url))
        }
        OpenAIError::Reqwest(e) => {
            LektionError::ModelUnavailable(format!("could not reach {}: {}", base_url, e))
        }
        OpenAIError::ApiError(api) => LektionError::ModelResponse(format!(
            "{} rejected the request: {}",
            base_url, api.message
        )),
        OpenAIError::JSONDeserialize(e) => {
            LektionError::ModelResponse(format!("malformed response: {}", e))
        }
        other => LektionError::ModelResponse(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockito::Server;

    fn settings_for(host: &str) -> ModelSettings {
        ModelSettings {
            host: host.to_string(),
            timeout_secs: 5,
            ..ModelSettings::default()
        }
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000u32,
            "model": "llama3.2",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_returns_text_unmodified() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("  Summary:\n- Photosynthesis\n"))
            .create_async()
            .await;

        let client = OllamaClient::from_settings(&settings_for(&server.url())).unwrap();
        let text = client
            .generate(&GenerateRequest::new("Summarize").with_system("Be brief"))
            .await
            .unwrap();

        assert_eq!(text, "  Summary:\n- Photosynthesis\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sends_model_and_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "messages": [{ "role": "user", "content": "Where does it happen?" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("In the chloroplasts."))
            .create_async()
            .await;

        let client = OllamaClient::from_settings(&settings_for(&server.url())).unwrap();
        let text = client
            .generate(&GenerateRequest::new("Where does it happen?"))
            .await
            .unwrap();

        assert_eq!(text, "In the chloroplasts.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_content_is_response_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("   \n"))
            .create_async()
            .await;

        let client = OllamaClient::from_settings(&settings_for(&server.url())).unwrap();
        let err = client.generate(&GenerateRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelResponse);
    }

    #[tokio::test]
    async fn test_malformed_body_is_response_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"not\": \"a completion\"}")
            .create_async()
            .await;

        let client = OllamaClient::from_settings(&settings_for(&server.url())).unwrap();
        let err = client.generate(&GenerateRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelResponse);
    }

    #[tokio::test]
    async fn test_rate_limited_fails_without_hidden_retry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":{"message":"server busy","type":"rate_limit","param":null,"code":null}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let settings = ModelSettings {
            host: server.url(),
            timeout_secs: 4,
            max_attempts: 1,
            ..ModelSettings::default()
        };
        let client = OllamaClient::from_settings(&settings).unwrap();

        let started = std::time::Instant::now();
        let err = client.generate(&GenerateRequest::new("hi")).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(err.kind(), ErrorKind::ModelResponse);
        assert!(err.to_string().contains("server busy"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        // Port 1 is never served locally
        let client = OllamaClient::from_settings(&settings_for("http://127.0.0.1:1")).unwrap();
        let err = client.generate(&GenerateRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());

        let settings = ModelSettings {
            host,
            timeout_secs: 1,
            ..ModelSettings::default()
        };
        let client = OllamaClient::from_settings(&settings).unwrap();

        let err = client.generate(&GenerateRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        drop(listener);
    }
}
