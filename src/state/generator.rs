//! Random letter sets that are known to be solvable.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::config::{GameConfig, CONSONANTS, MAX_VOWELS, MIN_VOWELS, NUM_LETTERS, VOWELS};
use super::dictionary::Dictionary;
use super::letters::{Letters, LettersError};

/// Result of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub letters: Letters,
    /// Candidates drawn, including the accepted one
    pub attempts: usize,
    /// True when the attempt budget ran out
    pub fallback: bool,
}

/// Draws letter sets and keeps the first one with enough formable words.
#[derive(Debug, Clone)]
pub struct LetterGenerator {
    dictionary: Arc<Dictionary>,
    min_solvable_words: usize,
    max_attempts: usize,
    fallback: Letters,
}

impl LetterGenerator {
    pub fn new(dictionary: Arc<Dictionary>, config: &GameConfig) -> Result<Self, LettersError> {
        Ok(Self {
            dictionary,
            min_solvable_words: config.min_solvable_words,
            max_attempts: config.max_generation_attempts,
            fallback: Letters::parse(&config.fallback_letters)?,
        })
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn fallback(&self) -> Letters {
        self.fallback
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Letters {
        self.generate_detailed(rng).letters
    }

    pub fn generate_detailed<R: Rng + ?Sized>(&self, rng: &mut R) -> GenerationOutcome {
        for attempt in 1..=self.max_attempts {
            let candidate = draw_candidate(rng);
            let count = self.dictionary.count_possible_words(candidate.as_slice());
            if count >= self.min_solvable_words {
                tracing::debug!(
                    letters = %candidate,
                    possible = count,
                    attempt,
                    "Accepted letter set"
                );
                return GenerationOutcome {
                    letters: candidate,
                    attempts: attempt,
                    fallback: false,
                };
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            fallback = %self.fallback,
            "No solvable letter set found, using fallback"
        );
        GenerationOutcome {
            letters: self.fallback,
            attempts: self.max_attempts,
            fallback: true,
        }
    }
}

/// Two or three distinct vowels plus distinct consonants, shuffled.
fn draw_candidate<R: Rng + ?Sized>(rng: &mut R) -> Letters {
    let vowel_count = rng.gen_range(MIN_VOWELS..=MAX_VOWELS);
    let mut drawn: Vec<char> = VOWELS.choose_multiple(rng, vowel_count).copied().collect();
    drawn.extend(
        CONSONANTS
            .choose_multiple(rng, NUM_LETTERS - vowel_count)
            .copied(),
    );
    drawn.shuffle(rng);

    let mut letters = ['A'; NUM_LETTERS];
    letters.copy_from_slice(&drawn);
    Letters::from_alphabet(letters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn common_words() -> Arc<Dictionary> {
        // Short words over a few very common letters, so most draws that
        // include them clear a low threshold.
        let mut words = Vec::new();
        for a in ['S', 'T', 'R', 'N', 'L'] {
            for v in VOWELS {
                for b in ['S', 'T', 'R', 'N', 'L'] {
                    words.push(format!("{a}{v}{b}"));
                }
            }
        }
        Arc::new(Dictionary::from_words(words).unwrap())
    }

    fn config(min_solvable_words: usize) -> GameConfig {
        GameConfig {
            min_solvable_words,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_candidate_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let letters = draw_candidate(&mut rng);
            let vowels = letters.vowel_count();
            assert!((MIN_VOWELS..=MAX_VOWELS).contains(&vowels));
            assert!(letters.as_slice().iter().all(|c| c.is_ascii_uppercase()));

            let mut distinct = letters.as_slice().to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            assert_eq!(distinct.len(), NUM_LETTERS);
        }
    }

    #[test]
    fn test_accepted_sets_meet_threshold() {
        let generator = LetterGenerator::new(common_words(), &config(3)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let outcome = generator.generate_detailed(&mut rng);
            let count = generator
                .dictionary()
                .count_possible_words(outcome.letters.as_slice());
            assert!(outcome.fallback || count >= 3);
        }
    }

    #[test]
    fn test_same_seed_same_letters() {
        let generator = LetterGenerator::new(common_words(), &config(3)).unwrap();
        let a = generator.generate(&mut ChaCha8Rng::seed_from_u64(1234));
        let b = generator.generate(&mut ChaCha8Rng::seed_from_u64(1234));
        assert_eq!(a, b);
    }

    #[test]
    fn test_falls_back_when_unsolvable() {
        let dict = Arc::new(Dictionary::from_words(["MAST", "STEM", "TEAM"]).unwrap());
        let generator = LetterGenerator::new(dict, &config(10)).unwrap();
        let outcome = generator.generate_detailed(&mut ChaCha8Rng::seed_from_u64(9));
        assert!(outcome.fallback);
        assert_eq!(outcome.attempts, 100);
        assert_eq!(outcome.letters, Letters::parse("MASTER").unwrap());
    }

    #[test]
    fn test_rejects_bad_fallback() {
        let cfg = GameConfig {
            fallback_letters: "ABC".to_string(),
            ..GameConfig::default()
        };
        assert!(LetterGenerator::new(common_words(), &cfg).is_err());
    }
}
