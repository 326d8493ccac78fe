//! Saved question sessions.
//!
//! A session records the transcript path, its summary, and the questions asked
//! about it, as one JSON file per session. Sessions can be listed, shown, and
//! resumed later without summarizing the transcript again.

use crate::error::{LektionError, Result};
use crate::query::Answer;
use crate::summarize::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// A question session about one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub transcript_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub summary: Summary,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

impl Session {
    /// Start a new session.
    pub fn new(transcript_path: &Path, summary: Summary) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript_path: transcript_path.to_path_buf(),
            started_at: Utc::now(),
            summary,
            exchanges: Vec::new(),
        }
    }

    /// Record an answered question.
    pub fn record(&mut self, question: &str, answer: &Answer) {
        self.exchanges.push(Exchange {
            question: question.to_string(),
            answer: answer.text.clone(),
            asked_at: Utc::now(),
        });
    }

    /// First eight characters of the id, used in file names and listings.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    fn file_name(&self) -> String {
        format!(
            "session_{}_{}.json",
            self.started_at.format("%Y%m%d_%H%M%S"),
            self.short_id()
        )
    }
}

/// Directory of saved sessions.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a session, replacing any earlier save of the same session.
    pub fn save(&self, session: &Session) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(session.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(session)?)?;
        debug!("Saved session {} to {}", session.id, path.display());
        Ok(path)
    }

    /// All readable sessions, oldest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<Session>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_session = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("session_") && n.ends_with(".json"));
            if !is_session {
                continue;
            }
            match read_session(&path) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }

    /// Load a session by file path, full id, or unique id prefix.
    pub fn load(&self, reference: &str) -> Result<Session> {
        let as_path = Path::new(reference);
        if as_path.is_file() {
            return read_session(as_path);
        }

        let needle = reference.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(LektionError::Session("empty session id".to_string()));
        }

        let mut matches: Vec<Session> = self
            .list()?
            .into_iter()
            .filter(|s| s.id.simple().to_string().starts_with(&needle))
            .collect();

        match matches.len() {
            0 => Err(LektionError::Session(format!("no session matches '{}'", reference))),
            1 => Ok(matches.remove(0)),
            n => Err(LektionError::Session(format!(
                "'{}' matches {} sessions, use a longer id",
                reference, n
            ))),
        }
    }
}

fn read_session(path: &Path) -> Result<Session> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| LektionError::Session(format!("{}: {}", path.display(), e)))
}

/// Write a summary to a timestamped text file in `dir`.
pub fn save_summary(dir: &Path, transcript_path: &Path, summary: &Summary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("summary_{}.txt", Utc::now().format("%Y%m%d_%H%M%S")));
    let content = format!(
        "Transcript: {}\n{}\n{}",
        transcript_path.display(),
        "=".repeat(50),
        summary
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Read a summary file, dropping the header written by [`save_summary`].
pub fn load_summary(path: &Path) -> Result<Summary> {
    let content = std::fs::read_to_string(path)?;
    let body = match content.split_once('\n') {
        Some((first, rest)) if first.starts_with("Transcript: ") => rest
            .split_once('\n')
            .filter(|(rule, _)| !rule.is_empty() && rule.chars().all(|c| c == '='))
            .map(|(_, body)| body)
            .unwrap_or(content.as_str()),
        _ => content.as_str(),
    };

    let body = body.trim();
    if body.is_empty() {
        return Err(LektionError::InvalidInput(format!(
            "summary file is empty: {}",
            path.display()
        )));
    }
    Ok(Summary::new(body))
}
