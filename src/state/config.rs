//! Game configuration and fixed rule constants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::letters::LetterRule;

/// Letters dealt per round.
pub const NUM_LETTERS: usize = 6;

/// Shortest word a player may submit.
pub const MIN_WORD_LENGTH: usize = 3;

/// Vowel count bounds for a generated letter set.
pub const MIN_VOWELS: usize = 2;
pub const MAX_VOWELS: usize = 3;

pub const VOWELS: [char; 5] = ['A', 'E', 'I', 'O', 'U'];

pub const CONSONANTS: [char; 21] = [
    'B', 'C', 'D', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W',
    'X', 'Y', 'Z',
];

/// Default round length in seconds.
pub const DEFAULT_GAME_DURATION_SECS: u64 = 60;

/// Points for a word of the given length, if that length scores at all.
pub fn score_for_length(len: usize) -> Option<u32> {
    match len {
        3 => Some(300),
        4 => Some(400),
        5 => Some(500),
        6 => Some(600),
        _ => None,
    }
}

/// Tunable game settings.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use anagram_state::GameConfig;
///
/// let config = GameConfig::from_json(r#"{ "duration_secs": 90 }"#).unwrap();
/// assert_eq!(config.duration_secs, 90);
/// assert_eq!(config.min_solvable_words, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Round length in seconds
    pub duration_secs: u64,

    /// Formable words a generated letter set needs before it is accepted
    pub min_solvable_words: usize,

    /// Candidate letter sets tried before falling back
    pub max_generation_attempts: usize,

    /// Letters dealt when no candidate meets the threshold
    pub fallback_letters: String,

    /// How submitted words are matched against the dealt letters
    pub letter_rule: LetterRule,

    /// Players needed before a multiplayer host may start
    pub min_multi_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_GAME_DURATION_SECS,
            min_solvable_words: 10,
            max_generation_attempts: 100,
            fallback_letters: "MASTER".to_string(),
            letter_rule: LetterRule::Reusable,
            min_multi_players: 2,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        let fallback_ok = self.fallback_letters.chars().count() == NUM_LETTERS
            && self.fallback_letters.chars().all(|c| c.is_ascii_alphabetic());
        if !fallback_ok {
            return Err(ConfigError::InvalidFallback(self.fallback_letters.clone()));
        }
        Ok(())
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.duration_secs as i64)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Game duration must be at least one second")]
    ZeroDuration,

    #[error("Fallback letters must be exactly 6 ASCII letters, got '{0}'")]
    InvalidFallback(String),
}
