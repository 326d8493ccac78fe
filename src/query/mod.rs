//! Question answering over a transcript and its summary.

use crate::config::{ModelSettings, Prompts};
use crate::error::{LektionError, Result};
use crate::model::{generate_with_retry, GenerateRequest, ModelClient};
use crate::summarize::Summary;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Context sent along with a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Summary and full transcript.
    Full,
    /// Summary only; the transcript did not fit the context window.
    SummaryOnly,
}

/// A model answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer, as returned by the model.
    pub text: String,
    /// Context the answer was generated from.
    pub context: ContextMode,
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Answers questions about one transcript. Holds no state between queries.
pub struct QueryEngine {
    client: Arc<dyn ModelClient>,
    transcript: Transcript,
    summary: Summary,
    settings: ModelSettings,
    prompts: Prompts,
    language: String,
}

impl QueryEngine {
    /// Create a query engine for a transcript and its summary.
    pub fn new(
        client: Arc<dyn ModelClient>,
        transcript: Transcript,
        summary: Summary,
        settings: ModelSettings,
    ) -> Self {
        Self {
            client,
            transcript,
            summary,
            settings,
            prompts: Prompts::default(),
            language: "English".to_string(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the language answers are written in.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Build the request for a question, falling back to summary-only
    /// context when the full prompt and the reply reserve exceed the
    /// context window.
    pub fn build_request(&self, question: &str) -> (GenerateRequest, ContextMode) {
        let input_budget = self
            .settings
            .context_window
            .saturating_sub(self.settings.max_tokens.unwrap_or(0) as usize);

        let full = self.request(&self.prompts.query.user, question, true);
        if full.estimated_tokens() <= input_budget {
            return (full, ContextMode::Full);
        }

        let reduced = self.request(&self.prompts.query.summary_only, question, false);
        if reduced.estimated_tokens() > input_budget {
            warn!(
                "Summary-only prompt ({} tokens) still exceeds the input budget ({})",
                reduced.estimated_tokens(),
                input_budget
            );
        }
        (reduced, ContextMode::SummaryOnly)
    }

    /// Answer a question about the transcript.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LektionError::InvalidInput("question is empty".to_string()));
        }

        let (request, context) = self.build_request(question);
        if context == ContextMode::SummaryOnly {
            info!("Transcript exceeds the context window, answering from the summary only");
        }

        let text =
            generate_with_retry(self.client.as_ref(), &request, self.settings.max_attempts).await?;
        if text.trim().is_empty() {
            return Err(LektionError::ModelResponse("empty answer from model".to_string()));
        }

        Ok(Answer { text, context })
    }

    fn request(&self, template: &str, question: &str, with_transcript: bool) -> GenerateRequest {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("summary".to_string(), self.summary.as_str().to_string());
        vars.insert("question".to_string(), question.to_string());
        if with_transcript {
            vars.insert("transcript".to_string(), self.transcript.full_text());
        }

        let system = self.prompts.render_with_custom(&self.prompts.query.system, &vars);
        let prompt = self.prompts.render_with_custom(template, &vars);

        GenerateRequest::new(prompt)
            .with_system(system)
            .with_options(&self.settings)
    }
}
