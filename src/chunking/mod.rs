//! Splitting long transcripts into chunks that fit the model's context window.
//!
//! Chunks are cut on turn boundaries. Each chunk after the first repeats the
//! trailing turns of the previous one, up to the overlap budget, so the model
//! sees where the conversation left off. A turn larger than the whole budget
//! is split on whitespace.

use crate::model::estimate_tokens;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// A consecutive slice of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Position of this chunk in the transcript.
    pub order: usize,
    /// Index of the first turn (partially) included.
    pub first_turn: usize,
    /// Index of the last turn (partially) included.
    pub last_turn: usize,
    /// `<speaker>: <text>` lines.
    pub text: String,
}

impl TranscriptChunk {
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum estimated tokens per chunk.
    pub budget_tokens: usize,
    /// Maximum estimated tokens repeated from the previous chunk.
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            budget_tokens: 8_000,
            overlap_tokens: 200,
        }
    }
}

/// A serialized turn, or a piece of one.
#[derive(Debug, Clone)]
struct Unit {
    turn: usize,
    text: String,
    tokens: usize,
}

impl Unit {
    fn new(turn: usize, text: String) -> Self {
        let tokens = line_tokens(text.chars().count());
        Self { turn, text, tokens }
    }
}

/// Tokens for a line of `chars` characters plus the newline joining it to the next.
fn line_tokens(chars: usize) -> usize {
    (chars + 1).div_ceil(4)
}

/// Turn-boundary chunker.
pub struct TurnChunker;

impl TurnChunker {
    pub fn new() -> Self {
        Self
    }

    /// Split a transcript into chunks. An empty transcript yields no chunks.
    pub fn chunk(&self, transcript: &Transcript, config: &ChunkingConfig) -> Vec<TranscriptChunk> {
        let budget = config.budget_tokens.max(1);

        let units: Vec<Unit> = transcript
            .turns()
            .iter()
            .enumerate()
            .flat_map(|(i, turn)| split_oversized(i, turn.to_line(), budget))
            .collect();

        let mut chunks = Vec::new();
        let mut current: Vec<Unit> = Vec::new();
        let mut current_tokens = 0;
        // Units in `current` that were carried over from the previous chunk
        let mut carried = 0;

        for unit in units {
            if !current.is_empty() && current_tokens + unit.tokens > budget {
                chunks.push(build_chunk(chunks.len(), &current));

                let mut overlap = take_overlap(&current, config.overlap_tokens);
                while !overlap.is_empty()
                    && overlap.iter().map(|u| u.tokens).sum::<usize>() + unit.tokens > budget
                {
                    overlap.remove(0);
                }
                carried = overlap.len();
                current_tokens = overlap.iter().map(|u| u.tokens).sum();
                current = overlap;
            }

            current_tokens += unit.tokens;
            current.push(unit);
        }

        if current.len() > carried {
            chunks.push(build_chunk(chunks.len(), &current));
        }

        chunks
    }
}

impl Default for TurnChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Trailing units whose combined size fits in `overlap_tokens`, never the whole chunk.
fn take_overlap(units: &[Unit], overlap_tokens: usize) -> Vec<Unit> {
    let mut taken = Vec::new();
    let mut tokens = 0;

    for unit in units.iter().rev().take(units.len().saturating_sub(1)) {
        if tokens + unit.tokens > overlap_tokens {
            break;
        }
        tokens += unit.tokens;
        taken.push(unit.clone());
    }

    taken.reverse();
    taken
}

/// Split a line into word-boundary pieces of at most `budget` tokens.
fn split_oversized(turn: usize, line: String, budget: usize) -> Vec<Unit> {
    if line_tokens(line.chars().count()) <= budget {
        return vec![Unit::new(turn, line)];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();

    for word in line.split_whitespace() {
        let candidate_len = if piece.is_empty() {
            word.chars().count()
        } else {
            piece.chars().count() + 1 + word.chars().count()
        };

        if !piece.is_empty() && line_tokens(candidate_len) > budget {
            pieces.push(Unit::new(turn, std::mem::take(&mut piece)));
        }
        if !piece.is_empty() {
            piece.push(' ');
        }
        piece.push_str(word);
    }

    if !piece.is_empty() {
        pieces.push(Unit::new(turn, piece));
    }
    pieces
}

fn build_chunk(order: usize, units: &[Unit]) -> TranscriptChunk {
    TranscriptChunk {
        order,
        first_turn: units.first().map(|u| u.turn).unwrap_or(0),
        last_turn: units.last().map(|u| u.turn).unwrap_or(0),
        text: units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;

    fn transcript(n: usize) -> Transcript {
        Transcript::new(
            (0..n)
                .map(|i| {
                    let speaker = if i % 2 == 0 { "TEACHER" } else { "SPEAKER_01" };
                    // "TEACHER: turn 00 xxxx..." lines of a fixed width
                    Turn::new(speaker, format!("turn {:02} {}", i, "x".repeat(20)))
                })
                .collect(),
        )
    }

    #[test]
    fn test_fits_in_one_chunk() {
        let t = transcript(4);
        let chunks = TurnChunker::new().chunk(&t, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, t.full_text());
        assert_eq!((chunks[0].first_turn, chunks[0].last_turn), (0, 3));
    }

    #[test]
    fn test_empty_transcript() {
        let chunks = TurnChunker::new().chunk(&Transcript::default(), &ChunkingConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunks_cover_all_turns_in_order() {
        let t = transcript(10);
        let config = ChunkingConfig {
            budget_tokens: 30,
            overlap_tokens: 0,
        };
        let chunks = TurnChunker::new().chunk(&t, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.estimated_tokens() <= 30, "{:?}", chunk);
        }
        // Without overlap, chunks partition the turns
        let joined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(joined, t.full_text());
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].last_turn + 1, pair[1].first_turn);
        }
    }

    #[test]
    fn test_overlap_repeats_trailing_turn() {
        let t = transcript(6);
        let config = ChunkingConfig {
            budget_tokens: 30,
            overlap_tokens: 12,
        };
        let chunks = TurnChunker::new().chunk(&t, &config);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].last_turn, pair[1].first_turn);
            let last_line = pair[0].text.lines().last().unwrap();
            assert_eq!(pair[1].text.lines().next().unwrap(), last_line);
        }
        assert_eq!(chunks.last().unwrap().last_turn, 5);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let t = transcript(9);
        let config = ChunkingConfig {
            budget_tokens: 25,
            overlap_tokens: 10,
        };
        let chunker = TurnChunker::new();
        assert_eq!(chunker.chunk(&t, &config), chunker.chunk(&t, &config));
    }

    #[test]
    fn test_oversized_turn_is_split() {
        let long = "word ".repeat(100);
        let t = Transcript::new(vec![Turn::new("TEACHER", long.trim())]);
        let config = ChunkingConfig {
            budget_tokens: 20,
            overlap_tokens: 0,
        };
        let chunks = TurnChunker::new().chunk(&t, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.estimated_tokens() <= 20);
            assert_eq!((chunk.first_turn, chunk.last_turn), (0, 0));
        }
        let words: usize = chunks.iter().map(|c| c.text.split_whitespace().count()).sum();
        // 100 words plus the "TEACHER:" prefix
        assert_eq!(words, 101);
    }
}
