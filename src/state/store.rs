//! Session registry: one session per chat.
//!
//! Each session sits behind its own mutex so player input and the round
//! timer never interleave on the same game, while different chats run
//! independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use super::letters::Letters;
use super::session::{GameContext, GameReport, GameSession, SessionError};

/// A session shared between input handlers and the round timer.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Lock a session, recovering from a poisoned lock.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

/// Tracks the active session of every chat.
#[derive(Debug)]
pub struct SessionStore {
    ctx: GameContext,
    sessions: Mutex<HashMap<i64, SharedSession>>,
    rng: Mutex<ChaCha8Rng>,
}

impl SessionStore {
    pub fn new(ctx: GameContext) -> Self {
        Self {
            ctx,
            sessions: Mutex::new(HashMap::new()),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Store with reproducible letter draws.
    pub fn with_seed(ctx: GameContext, seed: u64) -> Self {
        Self {
            ctx,
            sessions: Mutex::new(HashMap::new()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<i64, SharedSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create and start a solo game.
    pub fn create_solo(
        &self,
        chat_id: i64,
        user_id: i64,
        name: &str,
    ) -> Result<SharedSession, StoreError> {
        let mut sessions = self.sessions();
        if sessions.contains_key(&chat_id) {
            return Err(StoreError::AlreadyRunning(chat_id));
        }
        let session = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            GameSession::solo(chat_id, user_id, name, self.ctx.clone(), &mut *rng)
        };
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(chat_id, Arc::clone(&shared));
        Ok(shared)
    }

    /// Open a multiplayer lobby.
    pub fn create_multi(
        &self,
        chat_id: i64,
        host_id: i64,
        host_name: &str,
    ) -> Result<SharedSession, StoreError> {
        let mut sessions = self.sessions();
        if sessions.contains_key(&chat_id) {
            return Err(StoreError::AlreadyRunning(chat_id));
        }
        let session = GameSession::multi(chat_id, host_id, host_name, self.ctx.clone());
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(chat_id, Arc::clone(&shared));
        tracing::info!(chat_id, host_id, "Lobby opened");
        Ok(shared)
    }

    /// Host-initiated start using the store's random source.
    pub fn begin(&self, chat_id: i64, by_user: i64) -> Result<Letters, StoreError> {
        let shared = self.get(chat_id).ok_or(StoreError::NoSession(chat_id))?;
        let mut session = lock_session(&shared);
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(session.begin(by_user, &mut *rng)?)
    }

    pub fn get(&self, chat_id: i64) -> Option<SharedSession> {
        self.sessions().get(&chat_id).cloned()
    }

    /// Run `f` with the chat's session locked.
    pub fn with_session<T>(
        &self,
        chat_id: i64,
        f: impl FnOnce(&mut GameSession) -> T,
    ) -> Result<T, StoreError> {
        let shared = self.get(chat_id).ok_or(StoreError::NoSession(chat_id))?;
        let mut session = lock_session(&shared);
        Ok(f(&mut session))
    }

    pub fn remove(&self, chat_id: i64) -> Option<SharedSession> {
        self.sessions().remove(&chat_id)
    }

    /// Round timer hook: finalize the round the timer was armed for and
    /// drop it.
    ///
    /// `armed` is the handle returned by `create_solo`/`create_multi`. Returns
    /// `None` when that session was already removed or never started, or when
    /// the chat has moved on to a newer session, so a late or duplicate
    /// timer firing is harmless.
    pub fn expire(&self, chat_id: i64, armed: &SharedSession) -> Option<GameReport> {
        {
            let mut sessions = self.sessions();
            match sessions.get(&chat_id) {
                Some(current) if Arc::ptr_eq(current, armed) => {
                    sessions.remove(&chat_id);
                }
                Some(_) => {
                    tracing::debug!(chat_id, "Stale timer, chat has a newer session");
                    return None;
                }
                None => return None,
            }
        }
        let mut session = lock_session(armed);
        match session.finalize() {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::debug!(chat_id, error = %e, "Expired session had no round to finalize");
                None
            }
        }
    }

    /// Drop sessions whose round is over.
    pub fn cleanup_finished(&self) -> Vec<i64> {
        let mut sessions = self.sessions();
        let finished: Vec<i64> = sessions
            .iter()
            .filter(|(_, s)| lock_session(s).state().is_terminal())
            .map(|(id, _)| *id)
            .collect();

        for id in &finished {
            sessions.remove(id);
        }

        finished
    }

    /// Count sessions with a round in progress.
    pub fn active_count(&self) -> usize {
        self.sessions()
            .values()
            .filter(|s| lock_session(s).state().is_active())
            .count()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("A game is already running in chat {0}")]
    AlreadyRunning(i64),

    #[error("No game in chat {0}")]
    NoSession(i64),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::config::GameConfig;
    use crate::state::dictionary::Dictionary;
    use crate::state::session::SessionState;
    use pretty_assertions::assert_eq;

    fn store() -> SessionStore {
        let dict = Dictionary::from_words(["ART", "RAT", "TAR", "MAST", "STEM", "TEAM"]).unwrap();
        let ctx = GameContext::new(dict, GameConfig::default()).unwrap();
        SessionStore::with_seed(ctx, 42)
    }

    #[test]
    fn test_create_solo() {
        let store = store();
        let shared = store.create_solo(1, 10, "Alice").unwrap();
        assert_eq!(lock_session(&shared).state(), SessionState::Playing);
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_one_session_per_chat() {
        let store = store();
        store.create_multi(1, 10, "Alice").unwrap();
        assert_eq!(
            store.create_solo(1, 11, "Bob").unwrap_err(),
            StoreError::AlreadyRunning(1)
        );
        assert_eq!(
            store.create_multi(1, 11, "Bob").unwrap_err(),
            StoreError::AlreadyRunning(1)
        );
        store.create_solo(2, 11, "Bob").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_with_session_and_begin() {
        let store = store();
        store.create_multi(1, 10, "Alice").unwrap();
        store
            .with_session(1, |s| s.join(11, "Bob").map(|_| ()))
            .unwrap()
            .unwrap();

        assert_eq!(
            store.begin(1, 11).unwrap_err(),
            StoreError::Session(SessionError::NotHost)
        );
        let letters = store.begin(1, 10).unwrap();
        let dealt = store.with_session(1, |s| s.letters().copied()).unwrap();
        assert_eq!(dealt, Some(letters));

        assert_eq!(
            store.with_session(9, |_| ()).unwrap_err(),
            StoreError::NoSession(9)
        );
    }

    #[test]
    fn test_expire_finalizes_and_removes() {
        let store = store();
        let shared = store.create_solo(1, 10, "Alice").unwrap();

        let report = store.expire(1, &shared).unwrap();
        assert_eq!(report.chat_id, 1);
        assert!(store.get(1).is_none());

        // A second firing finds nothing
        assert_eq!(store.expire(1, &shared), None);
    }

    #[test]
    fn test_expire_unstarted_lobby() {
        let store = store();
        let shared = store.create_multi(1, 10, "Alice").unwrap();
        assert_eq!(store.expire(1, &shared), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_expire_leaves_next_round_alone() {
        let store = store();
        let first = store.create_solo(1, 10, "Alice").unwrap();
        store.with_session(1, |s| s.finalize()).unwrap().unwrap();
        assert_eq!(store.cleanup_finished(), vec![1]);

        let second = store.create_solo(1, 10, "Alice").unwrap();
        assert_eq!(store.expire(1, &first), None);

        assert_eq!(lock_session(&second).state(), SessionState::Playing);
        assert!(Arc::ptr_eq(&store.get(1).unwrap(), &second));
        assert!(store.expire(1, &second).is_some());
    }

    #[test]
    fn test_cleanup_finished() {
        let store = store();
        store.create_solo(1, 10, "Alice").unwrap();
        store.create_solo(2, 11, "Bob").unwrap();
        store.with_session(1, |s| s.finalize()).unwrap().unwrap();

        assert_eq!(store.cleanup_finished(), vec![1]);
        assert_eq!(store.len(), 1);
        assert!(store.get(2).is_some());
    }
}
