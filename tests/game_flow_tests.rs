//! Full game flows through the session store.

use std::sync::Arc;

use anagram_state::{
    lock_session, Dictionary, GameConfig, GameContext, Letters, ManualClock, Outcome,
    SessionError, SessionState, SessionStore, StoreError,
};
use chrono::Duration;
use pretty_assertions::assert_eq;

const WORDS: &str = "\
art
ear
rat
tar
tea
late
rate
real
tale
tear
irate
alert
alter
later
retail
ab
elephants
";

fn context(clock: Arc<ManualClock>) -> GameContext {
    let dict = Dictionary::from_reader(WORDS.as_bytes()).unwrap();
    GameContext::new(dict, GameConfig::default())
        .unwrap()
        .with_clock(clock)
}

// =============================================================================
// Multiplayer
// =============================================================================

#[test]
fn test_multiplayer_round() {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::with_seed(context(Arc::clone(&clock)), 1);
    let chat = -1001;

    let shared = store.create_multi(chat, 1, "Alice").unwrap();
    store
        .with_session(chat, |s| {
            s.join(2, "Bob")?;
            s.join(3, "Carol")?;
            s.start_with_letters(Letters::parse("AEILRT").unwrap())
        })
        .unwrap()
        .unwrap();

    let outcomes = store
        .with_session(chat, |s| {
            vec![
                s.validate_submission(1, "alert").unwrap(),
                s.validate_submission(2, "RETAIL").unwrap(),
                s.validate_submission(2, "retail").unwrap(),
                s.validate_submission(3, "tar").unwrap(),
                s.validate_submission(3, "zebra").unwrap(),
            ]
        })
        .unwrap();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Accepted {
                word: "ALERT".into(),
                points: 500
            },
            Outcome::Accepted {
                word: "RETAIL".into(),
                points: 600
            },
            Outcome::Duplicate("RETAIL".into()),
            Outcome::Accepted {
                word: "TAR".into(),
                points: 300
            },
            Outcome::InvalidLetters(vec!['Z', 'B']),
        ]
    );

    clock.advance(Duration::seconds(60));
    let refused = store.with_session(chat, |s| s.press_letter(1, 'A').map(|_| ()));
    assert_eq!(refused.unwrap(), Err(SessionError::TimeUp));

    let report = store.expire(chat, &shared).unwrap();
    let ranking: Vec<(&str, u32)> = report
        .rankings
        .iter()
        .map(|p| (p.display_name.as_str(), p.score()))
        .collect();
    assert_eq!(ranking, vec![("Bob", 600), ("Alice", 500), ("Carol", 300)]);
    assert_eq!(report.found_count, 3);
    assert_eq!(report.possible_count, 15);
    assert_eq!(
        report.missed,
        vec![
            "ART", "EAR", "RAT", "TEA", "LATE", "RATE", "REAL", "TALE", "TEAR", "ALTER", "IRATE",
            "LATER"
        ]
    );
    assert!(store.is_empty());
}

#[test]
fn test_lobby_cannot_start_alone() {
    let store = SessionStore::with_seed(context(Arc::new(ManualClock::default())), 1);
    store.create_multi(5, 1, "Alice").unwrap();
    assert_eq!(
        store.begin(5, 1).unwrap_err(),
        StoreError::Session(SessionError::NotEnoughPlayers { have: 1, need: 2 })
    );

    let shared = store.get(5).unwrap();
    assert_eq!(lock_session(&shared).state(), SessionState::Waiting);
    assert_eq!(lock_session(&shared).time_remaining(), 0);
}

#[test]
fn test_rejoin_keeps_progress() {
    let store = SessionStore::with_seed(context(Arc::new(ManualClock::default())), 1);
    store.create_multi(5, 1, "Alice").unwrap();
    let (name, score) = store
        .with_session(5, |s| {
            s.join(2, "Bob").unwrap();
            s.start_with_letters(Letters::parse("AEILRT").unwrap()).unwrap();
            s.validate_submission(2, "LATER").unwrap();
            let player = s.add_player(2, "Bobby");
            (player.display_name.clone(), player.score())
        })
        .unwrap();
    assert_eq!(name, "Bob");
    assert_eq!(score, 500);
}

#[test]
fn test_stale_timer_does_not_end_next_round() {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::with_seed(context(Arc::clone(&clock)), 4);

    // Round 1 ends early through the end-game button
    let first = store.create_solo(7, 1, "Alice").unwrap();
    clock.advance(Duration::seconds(10));
    store.with_session(7, |s| s.finalize()).unwrap().unwrap();
    assert_eq!(store.cleanup_finished(), vec![7]);

    clock.advance(Duration::seconds(10));
    let second = store.create_solo(7, 1, "Alice").unwrap();

    // Round 1's timer still fires at t=60
    clock.advance(Duration::seconds(40));
    assert_eq!(store.expire(7, &first), None);
    assert_eq!(store.len(), 1);
    {
        let session = lock_session(&second);
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.time_remaining(), 20);
    }

    clock.advance(Duration::seconds(20));
    assert!(store.expire(7, &second).is_some());
    assert!(store.is_empty());
}

// =============================================================================
// Solo
// =============================================================================

#[test]
fn test_solo_keyboard_flow() {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::with_seed(context(Arc::clone(&clock)), 99);
    let shared = store.create_solo(7, 1, "Alice").unwrap();

    let (letters, possible) = store
        .with_session(7, |s| (*s.letters().unwrap(), s.possible_words().to_vec()))
        .unwrap();
    assert_eq!(letters.as_slice().len(), 6);

    // Type the first possible word, if any, with the keypad
    if let Some(word) = possible.first().cloned() {
        let outcome = store
            .with_session(7, |s| {
                for c in word.chars() {
                    s.press_letter(1, c).unwrap();
                }
                s.submit(1).unwrap()
            })
            .unwrap();
        assert!(outcome.is_accepted());
    }

    clock.advance(Duration::seconds(30));
    let remaining = store.with_session(7, |s| s.time_remaining()).unwrap();
    assert_eq!(remaining, 30);

    let report = store.expire(7, &shared).unwrap();
    assert_eq!(report.letters, letters);
    assert_eq!(report.possible_count, possible.len());
    assert_eq!(report.found_count + report.missed.len(), possible.len());
}

#[test]
fn test_finalize_then_expire_returns_same_report() {
    let store = SessionStore::with_seed(context(Arc::new(ManualClock::default())), 3);
    let shared = store.create_solo(9, 1, "Alice").unwrap();

    // Explicit end-game path finishes first, then the timer fires
    let explicit = lock_session(&shared).finalize().unwrap();
    let timed = store.expire(9, &shared).unwrap();
    assert_eq!(explicit, timed);
}
