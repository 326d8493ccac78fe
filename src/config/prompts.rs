//! Prompt templates for Lektion.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub query: QueryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for transcript summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    /// Summarizes a whole transcript, or one chunk of it.
    pub user: String,
    /// Merges partial summaries of consecutive chunks.
    pub merge: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that analyzes classroom conversations between a teacher and students.

Rules:
- Use only information present in the transcript.
- Do not invent speakers, questions, or conclusions.
- Write in {{language}}."#
                .to_string(),

            user: r#"Analyze the following transcript of a conversation between a teacher and students.
{{part}}
Transcript:
{{transcript}}

Write a structured summary with these sections:
1. Summary: a short overview of the whole conversation (2-3 sentences)
2. Main topics: the topics discussed
3. Student questions: the important questions students asked
4. Key insights: the central conclusions or decisions reached"#
                .to_string(),

            merge: r#"The following are summaries of consecutive parts of one classroom conversation, in order.

{{summaries}}

Combine them into a single structured summary of the whole conversation with these sections:
1. Summary: a short overview of the whole conversation (2-3 sentences)
2. Main topics: the topics discussed
3. Student questions: the important questions students asked
4. Key insights: the central conclusions or decisions reached"#
                .to_string(),
        }
    }
}

/// Prompts for answering questions about a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    pub system: String,
    /// Summary plus full transcript.
    pub user: String,
    /// Summary only, used when the transcript does not fit the context window.
    pub summary_only: String,
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You answer questions about a classroom conversation between a teacher and students.

Guidelines:
- Answer using only the provided context.
- If the answer is not in the context, reply: "I cannot answer this question based on the given context."
- Be concise.
- Write in {{language}}."#
                .to_string(),

            user: r#"Summary of the conversation:
{{summary}}

Full transcript:
{{transcript}}

Question: {{question}}

Answer:"#
                .to_string(),

            summary_only: r#"Summary of the conversation:
{{summary}}

(The full transcript is too long to include; answer from the summary.)

Question: {{question}}

Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let query_path = custom_path.join("query.toml");
            if query_path.exists() {
                let content = std::fs::read_to_string(&query_path)?;
                prompts.query = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Set a variable available to every template.
    pub fn with_variable(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single left-to-right pass, so values containing
    /// `{{...}}` (e.g. transcript text) are never expanded again.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
