//! Word list index.
//!
//! Built once at startup from a newline-delimited word source and shared
//! read-only (behind an `Arc`) by the letter generator and every session.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

use thiserror::Error;

use super::config::{MIN_WORD_LENGTH, NUM_LETTERS};
use super::letters::LetterRule;

/// Immutable set of playable words (uppercase, 3 to 6 letters).
#[derive(Debug, Clone)]
pub struct Dictionary {
    /// Membership lookup
    words: HashSet<String>,

    /// Same words, ordered by (length, then alphabetical)
    sorted: Vec<String>,

    /// Word length to its slice of `sorted`
    by_length: BTreeMap<usize, Range<usize>>,

    rule: LetterRule,
}

impl Dictionary {
    /// Build from any sequence of tokens.
    ///
    /// Tokens are trimmed and uppercased; anything that is not purely ASCII
    /// alphabetic or falls outside the playable length range is dropped.
    pub fn from_words<I, S>(words: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for raw in words {
            if let Some(word) = normalize(raw.as_ref()) {
                set.insert(word);
            }
        }

        if set.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let mut sorted: Vec<String> = set.iter().cloned().collect();
        sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut by_length: BTreeMap<usize, Range<usize>> = BTreeMap::new();
        for (i, word) in sorted.iter().enumerate() {
            by_length
                .entry(word.len())
                .and_modify(|r| r.end = i + 1)
                .or_insert(i..i + 1);
        }

        let dictionary = Self {
            words: set,
            sorted,
            by_length,
            rule: LetterRule::default(),
        };

        tracing::info!(
            total = dictionary.len(),
            "Dictionary loaded: {} words (length {}-{})",
            dictionary.len(),
            MIN_WORD_LENGTH,
            NUM_LETTERS
        );
        for (length, range) in &dictionary.by_length {
            tracing::info!("  {}-letter words: {}", length, range.len());
        }

        Ok(dictionary)
    }

    /// Build from a newline-delimited reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DictionaryError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        Self::from_words(lines)
    }

    /// Load a newline-delimited word file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DictionaryError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Switch how words are matched against letter sets.
    pub fn with_letter_rule(mut self, rule: LetterRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn letter_rule(&self) -> LetterRule {
        self.rule
    }

    /// Case-insensitive membership.
    pub fn is_valid_word(&self, word: &str) -> bool {
        self.words.contains(&word.to_ascii_uppercase())
    }

    /// Check whether `word` can be spelled from `letters` under the active rule.
    pub fn can_form_word(&self, word: &str, letters: &[char]) -> bool {
        self.rule.allows(word, letters)
    }

    /// Characters of `word` the letters cannot supply.
    pub fn offending_letters(&self, word: &str, letters: &[char]) -> Vec<char> {
        self.rule.offending(word, letters)
    }

    /// Every formable word, shortest first, alphabetical within a length.
    pub fn find_possible_words(&self, letters: &[char]) -> Vec<String> {
        self.sorted
            .iter()
            .filter(|w| self.can_form_word(w, letters))
            .cloned()
            .collect()
    }

    /// Number of formable words, without collecting them.
    pub fn count_possible_words(&self, letters: &[char]) -> usize {
        self.sorted
            .iter()
            .filter(|w| self.can_form_word(w, letters))
            .count()
    }

    /// Words of one length, alphabetical.
    pub fn words_of_length(&self, len: usize) -> &[String] {
        match self.by_length.get(&len) {
            Some(range) => &self.sorted[range.clone()],
            None => &[],
        }
    }

    pub fn count_by_length(&self, len: usize) -> usize {
        self.words_of_length(len).len()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// All words, shortest first.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sorted.iter().map(String::as_str)
    }
}

fn normalize(raw: &str) -> Option<String> {
    let word = raw.trim();
    if !(MIN_WORD_LENGTH..=NUM_LETTERS).contains(&word.len()) {
        return None;
    }
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(word.to_ascii_uppercase())
}

/// Dictionary loading errors.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Cannot open word list '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Word list contains no playable words")]
    Empty,
}
