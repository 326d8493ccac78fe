//! Access to the local language model service.
//!
//! Components talk to the model through [`ModelClient`], so they can be
//! exercised with in-process fakes. [`OllamaClient`] is the production
//! implementation; [`OllamaProbe`] covers health checks and model pulls.

mod ollama;
mod openai_compat;

pub use ollama::{model_matches, OllamaProbe};
pub use openai_compat::{create_client, OllamaClient};

use crate::config::ModelSettings;
use crate::error::Result;
use async_trait::async_trait;
use tracing::warn;

/// A single text generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Optional system instructions.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Create a request with default sampling options.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.1,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Apply temperature and token limit from settings.
    pub fn with_options(mut self, settings: &ModelSettings) -> Self {
        self.temperature = settings.temperature;
        self.max_tokens = settings.max_tokens;
        self
    }

    /// Estimated input size of this request.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.prompt) + self.system.as_deref().map(estimate_tokens).unwrap_or(0)
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate text for a prompt.
    ///
    /// Fails with `ModelUnavailable` when the service cannot be reached in
    /// time and `ModelResponse` when it answers with nothing usable.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Name of the model requests are sent to.
    fn model_name(&self) -> &str;
}

/// Estimate the token count of a text (about four characters per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Issue a request, retrying up to `max_attempts` times while the service is unreachable.
pub async fn generate_with_retry(
    client: &dyn ModelClient,
    request: &GenerateRequest,
    max_attempts: u32,
) -> Result<String> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match client.generate(request).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "Model request failed (attempt {}/{}): {}",
                    attempt, max_attempts, e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process model fakes.

    use super::*;
    use crate::error::LektionError;
    use std::sync::Mutex;

    /// Returns a fixed response and records every prompt it receives.
    pub struct FixedModel {
        response: String,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FixedModel {
        pub fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for FixedModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Returns the prompt it was given.
    pub struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            Ok(request.prompt.clone())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    /// Fails as unreachable for the first `failures` calls, then echoes.
    pub struct FlakyModel {
        failures: u32,
        pub calls: Mutex<u32>,
    }

    impl FlakyModel {
        pub fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FlakyModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.failures {
                return Err(LektionError::ModelUnavailable("connection refused".to_string()));
            }
            Ok(request.prompt.clone())
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }
}
