//! State management module for the anagram game.
//!
//! - `dictionary` - Word list index (membership, formability, possible words)
//! - `letters` - Dealt letter sets and the letter matching rule
//! - `generator` - Random solvable letter sets
//! - `player` - Per-player input buffer, score, found words
//! - `session` - Game lifecycle and submission pipeline
//! - `store` - Chat to session registry, timer hook
//! - `config` / `clock` - Settings and time sources
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          SessionStore                             │
//! │                                                                   │
//! │   chat_id → Arc<Mutex<GameSession>>                               │
//! │                          │                                        │
//! │        ┌─────────────────┴─────────────────┐                      │
//! │        │            GameSession            │                      │
//! │        │  Waiting ──▶ Playing ──▶ Finished │                      │
//! │        │  players: user_id → Player        │                      │
//! │        └─────────────────┬─────────────────┘                      │
//! │                          │ GameContext (shared, read-only)        │
//! │        ┌─────────────────┼─────────────────┐                      │
//! │        ▼                 ▼                 ▼                      │
//! │   Arc<Dictionary>  LetterGenerator    Arc<dyn Clock>              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use anagram_state::state::{Dictionary, GameConfig, GameContext, Letters, Outcome};
//! use anagram_state::state::GameSession;
//!
//! let dict = Dictionary::from_words(["LATE", "TALE", "RATE", "ART"]).unwrap();
//! let ctx = GameContext::new(dict, GameConfig::default()).unwrap();
//!
//! let letters = Letters::parse("AEILRT").unwrap();
//! let mut session = GameSession::solo_with_letters(1, 42, "Alice", ctx, letters);
//!
//! let outcome = session.validate_submission(42, "late").unwrap();
//! assert_eq!(outcome, Outcome::Accepted { word: "LATE".into(), points: 400 });
//!
//! let report = session.finalize().unwrap();
//! assert_eq!(report.missed, vec!["ART", "RATE", "TALE"]);
//! ```

pub mod clock;
pub mod config;
pub mod dictionary;
pub mod generator;
pub mod letters;
pub mod player;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    score_for_length, ConfigError, GameConfig, CONSONANTS, DEFAULT_GAME_DURATION_SECS,
    MAX_VOWELS, MIN_VOWELS, MIN_WORD_LENGTH, NUM_LETTERS, VOWELS,
};
pub use dictionary::{Dictionary, DictionaryError};
pub use generator::{GenerationOutcome, LetterGenerator};
pub use letters::{LetterRule, Letters, LettersError};
pub use player::Player;
pub use session::{
    evaluate_submission, GameContext, GameReport, GameSession, Outcome, SessionError,
    SessionMode, SessionState, MISSED_WORDS_SHOWN,
};
pub use store::{lock_session, SessionStore, SharedSession, StoreError};
