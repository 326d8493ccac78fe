//! Pipeline wiring for Lektion.
//!
//! Builds the parser, prompts and model client from settings and hands out
//! summarizers and query engines that share them.

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::model::{ModelClient, OllamaClient};
use crate::query::QueryEngine;
use crate::summarize::{Summarizer, Summary};
use crate::transcript::{Transcript, TranscriptParser};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared components for summarizing and querying transcripts.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    parser: TranscriptParser,
    client: Arc<dyn ModelClient>,
}

impl Pipeline {
    /// Create a pipeline talking to the configured model service.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        info!(
            "Using model {} at {}",
            settings.model.model,
            settings.model.base_url()
        );
        let client: Arc<dyn ModelClient> = Arc::new(OllamaClient::from_settings(&settings.model)?);

        Ok(Self::with_components(settings, prompts, client))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        let parser = TranscriptParser::from_settings(&settings.parser);
        Self {
            settings,
            prompts,
            parser,
            client,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Parse a transcript file.
    #[instrument(skip(self))]
    pub fn parse(&self, path: &Path) -> Result<Transcript> {
        let transcript = self.parser.parse_file(path)?;
        info!(
            "Parsed {} turns from {} speakers",
            transcript.len(),
            transcript.speakers().len()
        );
        Ok(transcript)
    }

    /// A summarizer using the configured prompts and language.
    pub fn summarizer(&self) -> Summarizer {
        Summarizer::new(self.client.clone(), self.settings.model.clone())
            .with_prompts(self.prompts.clone())
            .with_language(&self.settings.general.language)
    }

    /// A query engine for a transcript and its summary.
    pub fn query_engine(&self, transcript: Transcript, summary: Summary) -> QueryEngine {
        QueryEngine::new(
            self.client.clone(),
            transcript,
            summary,
            self.settings.model.clone(),
        )
        .with_prompts(self.prompts.clone())
        .with_language(&self.settings.general.language)
    }
}
