//! Data models for parsed transcripts.

use serde::{Deserialize, Serialize};

/// Speaker label used by the teacher.
pub const TEACHER_LABEL: &str = "TEACHER";

/// One speaker's contiguous utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker identifier (e.g. "TEACHER", "SPEAKER_01").
    pub speaker: String,
    /// Utterance text with whitespace normalized.
    pub text: String,
}

impl Turn {
    /// Create a new turn.
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Whether this turn was spoken by the teacher.
    pub fn is_teacher(&self) -> bool {
        self.speaker == TEACHER_LABEL
    }

    /// Whether this turn contains a question.
    pub fn is_question(&self) -> bool {
        self.text.contains('?')
    }

    /// Serialize as a `<speaker>: <text>` line.
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}

/// An ordered, immutable sequence of turns parsed from one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create a transcript from turns in conversational order.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Turns in file order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Distinct speakers in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for turn in &self.turns {
            if !seen.contains(&turn.speaker.as_str()) {
                seen.push(&turn.speaker);
            }
        }
        seen
    }

    /// The full transcript as `<speaker>: <text>` lines.
    pub fn full_text(&self) -> String {
        self.turns
            .iter()
            .map(Turn::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Questions asked by anyone other than the teacher.
    pub fn student_questions(&self) -> Vec<&Turn> {
        self.turns
            .iter()
            .filter(|t| !t.is_teacher() && t.is_question())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::new(vec![
            Turn::new("TEACHER", "Hallo zusammen!"),
            Turn::new("SPEAKER_01", "Hallo!"),
            Turn::new("SPEAKER_02", "Wie geht es Ihnen?"),
            Turn::new("TEACHER", "Mir geht es gut, danke. Und euch?"),
        ])
    }

    #[test]
    fn test_full_text() {
        let transcript = Transcript::new(vec![
            Turn::new("TEACHER", "Hello class."),
            Turn::new("SPEAKER_01", "Hi teacher."),
        ]);
        assert_eq!(
            transcript.full_text(),
            "TEACHER: Hello class.\nSPEAKER_01: Hi teacher."
        );
    }

    #[test]
    fn test_student_questions_skip_teacher() {
        let transcript = sample();
        let questions = transcript.student_questions();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Wie geht es Ihnen?");
    }

    #[test]
    fn test_speakers_in_first_appearance_order() {
        assert_eq!(sample().speakers(), vec!["TEACHER", "SPEAKER_01", "SPEAKER_02"]);
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript::default();
        assert!(transcript.is_empty());
        assert_eq!(transcript.full_text(), "");
    }
}
