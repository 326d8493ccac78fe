//! Transcript summarization.
//!
//! A transcript that fits the context window is summarized with one request.
//! Longer transcripts are chunked on turn boundaries, each chunk summarized,
//! and the partial summaries merged by a final request.

use crate::chunking::{ChunkingConfig, TranscriptChunk, TurnChunker};
use crate::config::{ModelSettings, Prompts};
use crate::error::{LektionError, Result};
use crate::model::{estimate_tokens, generate_with_retry, GenerateRequest, ModelClient};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Model-generated summary of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(String);

impl Summary {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a transcript will be summarized.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryPlan {
    /// One request over the whole transcript.
    Single,
    /// One request per chunk, then a merge request.
    Chunked(Vec<TranscriptChunk>),
}

/// Produces summaries through a [`ModelClient`].
pub struct Summarizer {
    client: Arc<dyn ModelClient>,
    settings: ModelSettings,
    prompts: Prompts,
    language: String,
}

impl Summarizer {
    /// Create a summarizer with default prompts.
    pub fn new(client: Arc<dyn ModelClient>, settings: ModelSettings) -> Self {
        Self {
            client,
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

    /// Set the language the summary is written in.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Decide between a single request and chunk-and-merge.
    pub fn plan(&self, transcript: &Transcript) -> SummaryPlan {
        if estimate_tokens(&transcript.full_text()) <= self.transcript_budget(None) {
            return SummaryPlan::Single;
        }

        // The "part i of n" label grows with n, so size the budget for the
        // chunk count it produces.
        let mut labelled = 1;
        loop {
            let config = ChunkingConfig {
                budget_tokens: self.transcript_budget(Some((labelled, labelled))),
                overlap_tokens: self.settings.overlap,
            };
            let chunks = TurnChunker::new().chunk(transcript, &config);
            if chunks.len() <= labelled {
                return SummaryPlan::Chunked(chunks);
            }
            labelled = chunks.len();
        }
    }

    /// Summarize a transcript. The model's text is returned unmodified.
    #[instrument(skip(self, transcript), fields(turns = transcript.len()))]
    pub async fn summarize(&self, transcript: &Transcript) -> Result<Summary> {
        if transcript.is_empty() {
            return Err(LektionError::InvalidInput(
                "cannot summarize an empty transcript".to_string(),
            ));
        }

        match self.plan(transcript) {
            SummaryPlan::Single => {
                info!(
                    "Summarizing {} turns in one request with {}",
                    transcript.len(),
                    self.client.model_name()
                );
                let text = self.generate(self.chunk_prompt(&transcript.full_text(), None)).await?;
                Ok(Summary(text))
            }
            SummaryPlan::Chunked(chunks) => {
                info!(
                    "Summarizing {} turns in {} chunks",
                    transcript.len(),
                    chunks.len()
                );
                let total = chunks.len();
                let mut partials = Vec::with_capacity(total);

                for chunk in &chunks {
                    debug!(
                        "Summarizing chunk {}/{} (turns {}-{})",
                        chunk.order + 1,
                        total,
                        chunk.first_turn,
                        chunk.last_turn
                    );
                    let part = Some((chunk.order + 1, total));
                    partials.push(self.generate(self.chunk_prompt(&chunk.text, part)).await?);
                }

                let text = self.merge(partials).await?;
                Ok(Summary(text))
            }
        }
    }

    /// Tokens left for transcript text once the prompt template and the
    /// reply reserve are accounted for.
    fn transcript_budget(&self, part: Option<(usize, usize)>) -> usize {
        let overhead = self.chunk_prompt("", part).estimated_tokens() + self.reply_reserve();
        self.settings.context_window.saturating_sub(overhead).max(1)
    }

    fn reply_reserve(&self) -> usize {
        self.settings.max_tokens.unwrap_or(0) as usize
    }

    fn fits(&self, request: &GenerateRequest) -> bool {
        request.estimated_tokens() + self.reply_reserve() <= self.settings.context_window
    }

    /// Merge partial summaries, in groups when they do not fit one request.
    async fn merge(&self, mut partials: Vec<String>) -> Result<String> {
        loop {
            let request = self.merge_prompt(&partials);
            if self.fits(&request) {
                return self.generate(request).await;
            }

            let groups = self.merge_groups(&partials);
            if groups.len() >= partials.len() {
                return Err(LektionError::ModelResponse(format!(
                    "partial summaries are too long to merge within {} tokens",
                    self.settings.context_window
                )));
            }

            debug!(
                "Merging {} partial summaries in {} groups",
                partials.len(),
                groups.len()
            );
            let mut merged = Vec::with_capacity(groups.len());
            for group in groups {
                if group.len() == 1 {
                    merged.extend(group);
                } else {
                    merged.push(self.generate(self.merge_prompt(&group)).await?);
                }
            }
            partials = merged;
        }
    }

    /// Pack consecutive partials into groups whose merge request fits.
    fn merge_groups(&self, partials: &[String]) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for partial in partials {
            current.push(partial.clone());
            if current.len() > 1 && !self.fits(&self.merge_prompt(&current)) {
                let last = current.pop();
                groups.push(std::mem::take(&mut current));
                current.extend(last);
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    fn vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), self.language.clone());
        vars
    }

    fn request(&self, prompt: String) -> GenerateRequest {
        let vars = self.vars();
        GenerateRequest::new(prompt)
            .with_system(self.prompts.render_with_custom(&self.prompts.summary.system, &vars))
            .with_options(&self.settings)
    }

    fn chunk_prompt(&self, text: &str, part: Option<(usize, usize)>) -> GenerateRequest {
        let mut vars = self.vars();
        vars.insert("transcript".to_string(), text.to_string());
        let part = match part {
            Some((i, n)) => format!("This is part {} of {} of the conversation.\n", i, n),
            None => String::new(),
        };
        vars.insert("part".to_string(), part);

        self.request(self.prompts.render_with_custom(&self.prompts.summary.user, &vars))
    }

    fn merge_prompt(&self, partials: &[String]) -> GenerateRequest {
        let summaries = partials
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Part {}:\n{}", i + 1, s.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = self.vars();
        vars.insert("summaries".to_string(), summaries);
        self.request(self.prompts.render_with_custom(&self.prompts.summary.merge, &vars))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let text =
            generate_with_retry(self.client.as_ref(), &request, self.settings.max_attempts).await?;
        if text.trim().is_empty() {
            return Err(LektionError::ModelResponse("empty summary from model".to_string()));
        }
        Ok(text)
    }
}
