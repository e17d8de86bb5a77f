//! Per-player round state: the letter input buffer, score, and found words.

use super::config::{score_for_length, NUM_LETTERS};

/// A player in one anagram round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Chat user ID
    pub user_id: i64,

    /// Name shown on the lobby and results screens
    pub display_name: String,

    score: u32,

    /// Scoring words in discovery order, uppercase, no repeats
    found_words: Vec<String>,

    /// Letters typed so far for the next submission
    input: String,

    /// Tile each buffered letter came from; `None` when typed by character
    input_tiles: Vec<Option<usize>>,

    /// Feedback for the last submission, shown under the board
    pub last_message: Option<String>,
}

impl Player {
    pub fn new(user_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            score: 0,
            found_words: Vec::new(),
            input: String::new(),
            input_tiles: Vec::new(),
            last_message: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn found_words(&self) -> &[String] {
        &self.found_words
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_input_full(&self) -> bool {
        self.input_tiles.len() >= NUM_LETTERS
    }

    /// Append a letter to the buffer unless it is already full.
    pub fn add_letter(&mut self, letter: char) -> bool {
        self.push(letter, None)
    }

    /// Append the letter on tile `position`. Whether a tile may be pressed
    /// twice is up to the session's letter rule.
    pub fn add_tile(&mut self, letter: char, position: usize) -> bool {
        self.push(letter, Some(position))
    }

    fn push(&mut self, letter: char, tile: Option<usize>) -> bool {
        if self.is_input_full() {
            return false;
        }
        self.input.push(letter.to_ascii_uppercase());
        self.input_tiles.push(tile);
        true
    }

    /// Remove the last letter, freeing its tile.
    pub fn backspace(&mut self) {
        self.input.pop();
        self.input_tiles.pop();
    }

    /// Take back the most recent letter that came from tile `position`.
    ///
    /// Returns false if the tile is not in the buffer.
    pub fn restore_tile(&mut self, position: usize) -> bool {
        let Some(idx) = self.input_tiles.iter().rposition(|t| *t == Some(position)) else {
            return false;
        };
        self.input_tiles.remove(idx);
        self.input = self
            .input
            .chars()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, c)| c)
            .collect();
        true
    }

    pub fn uses_tile(&self, position: usize) -> bool {
        self.input_tiles.contains(&Some(position))
    }

    /// Tiles currently in the buffer, ascending, no repeats.
    pub fn used_tiles(&self) -> Vec<usize> {
        let mut used: Vec<usize> = self.input_tiles.iter().flatten().copied().collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    pub fn reset_input(&mut self) {
        self.input.clear();
        self.input_tiles.clear();
    }

    /// Take the buffered word, leaving the buffer empty.
    pub fn take_input(&mut self) -> String {
        self.input_tiles.clear();
        std::mem::take(&mut self.input)
    }

    /// Record a found word and return the points it earned.
    ///
    /// Repeats and unscored lengths earn 0 and change nothing.
    pub fn add_word(&mut self, word: &str) -> u32 {
        let word = word.to_ascii_uppercase();
        if self.found_words.contains(&word) {
            return 0;
        }
        let Some(points) = score_for_length(word.chars().count()) else {
            return 0;
        };
        self.found_words.push(word);
        self.score += points;
        points
    }

    pub fn has_found(&self, word: &str) -> bool {
        let word = word.to_ascii_uppercase();
        self.found_words.contains(&word)
    }

    /// Found words paired with the points each earned.
    pub fn words_with_points(&self) -> impl Iterator<Item = (&str, u32)> {
        self.found_words
            .iter()
            .map(|w| (w.as_str(), score_for_length(w.chars().count()).unwrap_or(0)))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "display_name": self.display_name,
            "score": self.score,
            "found_words": self.found_words,
            "input": self.input,
            "used_tiles": self.used_tiles(),
            "last_message": self.last_message
        })
    }
}
