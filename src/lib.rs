//! Anagram State Library
//!
//! This crate provides the game session engine for a timed, multiplayer
//! anagram game played inside a chat.
//!
//! # Overview
//!
//! Players share six letters and race to submit as many dictionary words as
//! they can before the round timer runs out. The state module provides:
//!
//! - **Dictionary Index** - An immutable word list answering membership and
//!   "can these letters spell it" queries.
//!
//! - **Letter Generation** - Random six-letter sets with two or three vowels,
//!   retried until enough words can be formed.
//!
//! - **Game Sessions** - Lobby, round and results lifecycle with a fixed
//!   submission check order and scoring table.
//!
//! - **Session Store** - One locked session per chat, plus the hook the round
//!   timer calls when time is up.
//!
//! # Design Principles
//!
//! 1. **State only moves forward** - Waiting, then Playing, then Finished.
//!    Finalizing twice returns the same results.
//!
//! 2. **Rejections are values** - A bad word is an `Outcome`, never an error.
//!
//! 3. **No transport** - Sending messages, keyboards and timers belong to the
//!    chat adapter; this crate is pure state.
//!
//! 4. **Injected collaborators** - Dictionary, clock and randomness are passed
//!    in, so games can be replayed deterministically in tests.
//!
//! # Example
//!
//! ```rust
//! use anagram_state::{Dictionary, GameConfig, GameContext, SessionStore};
//!
//! let dict = Dictionary::from_words(["LATE", "TALE", "RATE", "TEAR", "ART"]).unwrap();
//! let ctx = GameContext::new(dict, GameConfig::default()).unwrap();
//! let store = SessionStore::with_seed(ctx, 7);
//!
//! // Multiplayer lobby
//! let lobby = store.create_multi(-100, 1, "Alice").unwrap();
//! store.with_session(-100, |s| s.join(2, "Bob").map(|_| ())).unwrap().unwrap();
//! store.begin(-100, 1).unwrap();
//!
//! // Round timer fires
//! let report = store.expire(-100, &lobby).unwrap();
//! assert_eq!(report.rankings.len(), 2);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
