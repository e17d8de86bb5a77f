//! Dealt letters and the rule for forming words from them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::{NUM_LETTERS, VOWELS};

/// How a word is matched against the dealt letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterRule {
    /// Any dealt letter may appear any number of times ("Letters can be reused!")
    #[default]
    Reusable,
    /// Each dealt tile may be used at most once per word
    Exact,
}

impl LetterRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reusable => "reusable",
            Self::Exact => "exact",
        }
    }

    /// Characters of `word` that the letters cannot supply, deduplicated in
    /// order of first appearance. Empty means the word can be formed.
    pub fn offending(&self, word: &str, letters: &[char]) -> Vec<char> {
        let mut available: HashMap<char, usize> = HashMap::new();
        for l in letters {
            *available.entry(l.to_ascii_uppercase()).or_insert(0) += 1;
        }

        let mut used: HashMap<char, usize> = HashMap::new();
        let mut bad = Vec::new();
        for c in word.chars().map(|c| c.to_ascii_uppercase()) {
            let count = used.entry(c).or_insert(0);
            *count += 1;
            let have = available.get(&c).copied().unwrap_or(0);
            let short = match self {
                Self::Reusable => have == 0,
                Self::Exact => *count > have,
            };
            if short && !bad.contains(&c) {
                bad.push(c);
            }
        }
        bad
    }

    pub fn allows(&self, word: &str, letters: &[char]) -> bool {
        self.offending(word, letters).is_empty()
    }
}

/// Exactly six uppercase letters, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Letters([char; NUM_LETTERS]);

impl Letters {
    pub fn new(letters: [char; NUM_LETTERS]) -> Result<Self, LettersError> {
        if let Some(bad) = letters.iter().find(|c| !c.is_ascii_alphabetic()) {
            return Err(LettersError::NotALetter(*bad));
        }
        Ok(Self(letters.map(|c| c.to_ascii_uppercase())))
    }

    /// Wrap letters already known to be uppercase ASCII.
    pub(crate) fn from_alphabet(letters: [char; NUM_LETTERS]) -> Self {
        Self(letters)
    }

    /// Parse from a string such as `"aeilrt"`.
    pub fn parse(input: &str) -> Result<Self, LettersError> {
        let chars: Vec<char> = input.chars().collect();
        let arr: [char; NUM_LETTERS] = chars
            .as_slice()
            .try_into()
            .map_err(|_| LettersError::WrongLength(chars.len()))?;
        Self::new(arr)
    }

    pub fn as_slice(&self) -> &[char] {
        &self.0
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c.to_ascii_uppercase())
    }

    pub fn vowel_count(&self) -> usize {
        self.0.iter().filter(|c| VOWELS.contains(c)).count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.0.iter().map(|c| c.to_string()).collect::<Vec<_>>())
    }
}

impl fmt::Display for Letters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LettersError {
    #[error("Expected 6 letters, got {0}")]
    WrongLength(usize),

    #[error("'{0}' is not a letter")]
    NotALetter(char),
}
