//! Configuration module for Lektion.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QueryPrompts, SummaryPrompts};
pub use settings::{GeneralSettings, ModelSettings, ParserSettings, PromptSettings, Settings};
