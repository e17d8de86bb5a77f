//! Game session state machine.
//!
//! ```text
//! ┌─────────┐   start / begin   ┌─────────┐    finalize    ┌──────────┐
//! │ Waiting │──────────────────▶│ Playing │───────────────▶│ Finished │
//! └─────────┘                   └─────────┘                └──────────┘
//!   (multi lobby)          (letters drawn, word            (report cached;
//!                           list snapshotted)               finalize again
//!                                                           returns it)
//! ```
//!
//! Solo sessions are created and started in one step. Transitions only move
//! forward and each fires at most once.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use super::clock::{Clock, SystemClock};
use super::config::{ConfigError, GameConfig, MIN_WORD_LENGTH, NUM_LETTERS};
use super::dictionary::Dictionary;
use super::generator::LetterGenerator;
use super::letters::{LetterRule, Letters};
use super::player::Player;

/// How many missed words the results screen lists before summarizing.
pub const MISSED_WORDS_SHOWN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Solo,
    Multi,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Multi => "multi",
        }
    }
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Multiplayer lobby, accepting joins
    #[default]
    Waiting,
    /// Round in progress
    Playing,
    /// Round over, report computed
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }

    /// Check if the session accepts player input.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if the session can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only collaborators every session needs.
#[derive(Debug, Clone)]
pub struct GameContext {
    pub dictionary: Arc<Dictionary>,
    pub generator: LetterGenerator,
    pub clock: Arc<dyn Clock>,
    pub config: GameConfig,
}

impl GameContext {
    /// Validate `config`, apply its letter rule to the dictionary, and build
    /// the generator. Uses the wall clock.
    pub fn new(dictionary: Dictionary, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dictionary = Arc::new(dictionary.with_letter_rule(config.letter_rule));
        let generator = LetterGenerator::new(Arc::clone(&dictionary), &config)
            .map_err(|_| ConfigError::InvalidFallback(config.fallback_letters.clone()))?;
        Ok(Self {
            dictionary,
            generator,
            clock: Arc::new(SystemClock),
            config,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Result of one word submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted { word: String, points: u32 },
    TooShort,
    TooLong,
    /// Letters in the word that the dealt set cannot supply
    InvalidLetters(Vec<char>),
    Duplicate(String),
    NotAWord(String),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn points(&self) -> u32 {
        match self {
            Self::Accepted { points, .. } => *points,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::InvalidLetters(_) => "invalid_letters",
            Self::Duplicate(_) => "duplicate",
            Self::NotAWord(_) => "not_a_word",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { word, points } => write!(f, "+{} pts for {}!", points, word),
            Self::TooShort => write!(f, "Too short! Need {}+ letters.", MIN_WORD_LENGTH),
            Self::TooLong => write!(f, "Too long! Max {} letters.", NUM_LETTERS),
            Self::InvalidLetters(bad) => {
                let bad: Vec<String> = bad.iter().map(|c| c.to_string()).collect();
                write!(f, "Letter(s) {} not in your letters!", bad.join(","))
            }
            Self::Duplicate(word) => write!(f, "Already found {}!", word),
            Self::NotAWord(word) => write!(f, "{} is not a valid word!", word),
        }
    }
}

/// Run the submission checks in order, recording the word if it passes.
pub fn evaluate_submission(
    dictionary: &Dictionary,
    letters: &Letters,
    player: &mut Player,
    raw_word: &str,
) -> Outcome {
    let word = raw_word.trim().to_ascii_uppercase();
    let len = word.chars().count();

    if len < MIN_WORD_LENGTH {
        return Outcome::TooShort;
    }
    if len > NUM_LETTERS {
        return Outcome::TooLong;
    }
    let bad = dictionary.offending_letters(&word, letters.as_slice());
    if !bad.is_empty() {
        return Outcome::InvalidLetters(bad);
    }
    if player.has_found(&word) {
        return Outcome::Duplicate(word);
    }
    if !dictionary.is_valid_word(&word) {
        return Outcome::NotAWord(word);
    }
    let points = player.add_word(&word);
    Outcome::Accepted { word, points }
}

/// End-of-round results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub chat_id: i64,
    pub letters: Letters,
    /// Highest score first; ties keep join order
    pub rankings: Vec<Player>,
    /// Formable words nobody found, shortest first
    pub missed: Vec<String>,
    /// Distinct words found across all players
    pub found_count: usize,
    pub possible_count: usize,
}

impl GameReport {
    pub fn winner(&self) -> Option<&Player> {
        self.rankings.first()
    }

    /// The first `limit` missed words and how many more there are.
    pub fn missed_preview(&self, limit: usize) -> (&[String], usize) {
        let shown = &self.missed[..self.missed.len().min(limit)];
        (shown, self.missed.len() - shown.len())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rankings: Vec<serde_json::Value> = self
            .rankings
            .iter()
            .enumerate()
            .map(|(i, p)| {
                serde_json::json!({
                    "rank": i + 1,
                    "user_id": p.user_id,
                    "display_name": p.display_name,
                    "score": p.score(),
                    "words": p.found_words().len()
                })
            })
            .collect();
        let (shown, more) = self.missed_preview(MISSED_WORDS_SHOWN);

        serde_json::json!({
            "chat_id": self.chat_id,
            "letters": self.letters.to_json(),
            "rankings": rankings,
            "missed": shown,
            "missed_more": more,
            "found_count": self.found_count,
            "possible_count": self.possible_count
        })
    }
}

/// One anagram game in one chat.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Chat this session belongs to
    pub chat_id: i64,

    pub mode: SessionMode,

    state: SessionState,

    /// Dealt letters, set on start
    letters: Option<Letters>,

    /// Players indexed by user_id
    players: HashMap<i64, Player>,

    /// user_ids in join order
    join_order: Vec<i64>,

    /// Lobby owner (multiplayer only)
    host_id: Option<i64>,

    /// Every formable word, snapshotted on start
    possible_words: Vec<String>,

    /// Computed once by finalize
    report: Option<GameReport>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    ctx: GameContext,
}

impl GameSession {
    fn new(chat_id: i64, mode: SessionMode, host_id: Option<i64>, ctx: GameContext) -> Self {
        Self {
            chat_id,
            mode,
            state: SessionState::Waiting,
            letters: None,
            players: HashMap::new(),
            join_order: Vec::new(),
            host_id,
            possible_words: Vec::new(),
            report: None,
            created_at: ctx.clock.now(),
            started_at: None,
            ended_at: None,
            ctx,
        }
    }

    /// Open a multiplayer lobby with the host already joined.
    pub fn multi(chat_id: i64, host_id: i64, host_name: &str, ctx: GameContext) -> Self {
        let mut session = Self::new(chat_id, SessionMode::Multi, Some(host_id), ctx);
        session.add_player(host_id, host_name);
        session
    }

    /// Create a solo session and start its round immediately.
    pub fn solo<R: Rng + ?Sized>(
        chat_id: i64,
        user_id: i64,
        name: &str,
        ctx: GameContext,
        rng: &mut R,
    ) -> Self {
        let mut session = Self::new(chat_id, SessionMode::Solo, None, ctx);
        session.add_player(user_id, name);
        let letters = session.ctx.generator.generate(rng);
        session.begin_round(letters);
        session
    }

    /// Solo session with fixed letters.
    pub fn solo_with_letters(
        chat_id: i64,
        user_id: i64,
        name: &str,
        ctx: GameContext,
        letters: Letters,
    ) -> Self {
        let mut session = Self::new(chat_id, SessionMode::Solo, None, ctx);
        session.add_player(user_id, name);
        session.begin_round(letters);
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn letters(&self) -> Option<&Letters> {
        self.letters.as_ref()
    }

    pub fn host_id(&self) -> Option<i64> {
        self.host_id
    }

    pub fn is_host(&self, user_id: i64) -> bool {
        self.host_id == Some(user_id)
    }

    pub fn possible_words(&self) -> &[String] {
        &self.possible_words
    }

    pub fn config(&self) -> &GameConfig {
        &self.ctx.config
    }

    /// Add a player, or return the existing one untouched.
    pub fn add_player(&mut self, user_id: i64, display_name: &str) -> &Player {
        if !self.players.contains_key(&user_id) {
            self.join_order.push(user_id);
        }
        self.players
            .entry(user_id)
            .or_insert_with(|| Player::new(user_id, display_name))
    }

    /// Lobby join: only while waiting, and only once per player.
    pub fn join(&mut self, user_id: i64, display_name: &str) -> Result<&Player, SessionError> {
        if self.state != SessionState::Waiting {
            return Err(SessionError::NotWaiting);
        }
        if self.players.contains_key(&user_id) {
            return Err(SessionError::AlreadyJoined);
        }
        tracing::info!(chat_id = self.chat_id, user_id, "Player joined lobby");
        Ok(self.add_player(user_id, display_name))
    }

    /// Host-initiated start of a multiplayer lobby.
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        by_user: i64,
        rng: &mut R,
    ) -> Result<Letters, SessionError> {
        if self.state != SessionState::Waiting {
            return Err(SessionError::NotWaiting);
        }
        if !self.is_host(by_user) {
            return Err(SessionError::NotHost);
        }
        let need = self.ctx.config.min_multi_players;
        if self.players.len() < need {
            return Err(SessionError::NotEnoughPlayers {
                have: self.players.len(),
                need,
            });
        }
        self.start(rng)
    }

    /// Draw letters and start the round.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Letters, SessionError> {
        self.ensure_state("start", SessionState::Waiting)?;
        let letters = self.ctx.generator.generate(rng);
        self.begin_round(letters);
        Ok(letters)
    }

    /// Start the round with fixed letters.
    pub fn start_with_letters(&mut self, letters: Letters) -> Result<(), SessionError> {
        self.ensure_state("start", SessionState::Waiting)?;
        self.begin_round(letters);
        Ok(())
    }

    fn begin_round(&mut self, letters: Letters) {
        self.possible_words = self.ctx.dictionary.find_possible_words(letters.as_slice());
        self.letters = Some(letters);
        self.started_at = Some(self.ctx.clock.now());
        self.state = SessionState::Playing;

        tracing::info!(
            chat_id = self.chat_id,
            mode = self.mode.as_str(),
            letters = %letters,
            possible = self.possible_words.len(),
            players = self.players.len(),
            "Game started"
        );
    }

    /// When the round ends, once started.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.started_at.map(|t| t + self.ctx.config.duration())
    }

    /// Whole seconds left in the round; 0 unless playing.
    pub fn time_remaining(&self) -> u64 {
        if self.state != SessionState::Playing {
            return 0;
        }
        let Some(started) = self.started_at else {
            return 0;
        };
        let duration = self.ctx.config.duration();
        let elapsed = (self.ctx.clock.now() - started).max(chrono::Duration::zero());
        (duration - elapsed).num_seconds().max(0) as u64
    }

    /// Validate a word for a player and score it if accepted.
    ///
    /// Rejections are returned as outcomes. The player's input buffer is
    /// cleared either way.
    pub fn validate_submission(
        &mut self,
        user_id: i64,
        raw_word: &str,
    ) -> Result<Outcome, SessionError> {
        let letters = self.dealt("submit")?;
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;

        let outcome = evaluate_submission(&self.ctx.dictionary, &letters, player, raw_word);
        player.reset_input();
        player.last_message = Some(outcome.to_string());

        tracing::debug!(
            chat_id = self.chat_id,
            user_id,
            word = raw_word,
            outcome = outcome.as_str(),
            points = outcome.points(),
            "Submission"
        );
        Ok(outcome)
    }

    /// Type a letter into a player's buffer.
    ///
    /// The letter is taken from a matching tile when the dealt set has one.
    /// Under `LetterRule::Exact` a letter whose tiles are all in the buffer
    /// is refused.
    pub fn press_letter(&mut self, user_id: i64, letter: char) -> Result<&Player, SessionError> {
        let letters = self.ensure_input_open("type")?;
        if !letter.is_ascii_alphabetic() {
            return Err(SessionError::NotALetter(letter));
        }
        let letter = letter.to_ascii_uppercase();
        let exact = self.ctx.dictionary.letter_rule() == LetterRule::Exact;
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;
        if player.is_input_full() {
            return Ok(player);
        }

        let tiles: Vec<usize> = letters
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == letter)
            .map(|(i, _)| i)
            .collect();
        let free = tiles.iter().copied().find(|&i| !player.uses_tile(i));
        match (free, tiles.first()) {
            (Some(i), _) => {
                player.add_tile(letter, i);
            }
            (None, Some(_)) if exact => return Err(SessionError::LetterUsedUp(letter)),
            (None, Some(&i)) => {
                player.add_tile(letter, i);
            }
            (None, None) => {
                player.add_letter(letter);
            }
        }
        player.last_message = None;
        Ok(player)
    }

    /// Press the tile at `position` (0-based) on a player's keypad.
    ///
    /// Under `LetterRule::Exact` each tile goes into the buffer at most once.
    pub fn press_tile(&mut self, user_id: i64, position: usize) -> Result<&Player, SessionError> {
        let letters = self.ensure_input_open("type")?;
        let letter = *letters
            .as_slice()
            .get(position)
            .ok_or(SessionError::NoSuchTile(position))?;
        let exact = self.ctx.dictionary.letter_rule() == LetterRule::Exact;
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;
        if exact && player.uses_tile(position) {
            return Err(SessionError::TileUsed(position));
        }
        player.add_tile(letter, position);
        player.last_message = None;
        Ok(player)
    }

    /// Take a tile's letter back out of a player's buffer. Restoring a tile
    /// that is not in the buffer changes nothing.
    pub fn restore_tile(&mut self, user_id: i64, position: usize) -> Result<&Player, SessionError> {
        self.ensure_input_open("type")?;
        if position >= NUM_LETTERS {
            return Err(SessionError::NoSuchTile(position));
        }
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;
        player.restore_tile(position);
        player.last_message = None;
        Ok(player)
    }

    pub fn press_backspace(&mut self, user_id: i64) -> Result<&Player, SessionError> {
        self.ensure_input_open("type")?;
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;
        player.backspace();
        player.last_message = None;
        Ok(player)
    }

    /// Submit whatever the player has typed.
    pub fn submit(&mut self, user_id: i64) -> Result<Outcome, SessionError> {
        self.ensure_input_open("submit")?;
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownPlayer(user_id))?;
        let word = player.take_input();
        if word.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.validate_submission(user_id, &word)
    }

    /// Players by score, highest first. Equal scores keep join order.
    pub fn get_rankings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players().collect();
        ranked.sort_by(|a, b| b.score().cmp(&a.score()));
        ranked
    }

    /// End the round and compute the report.
    ///
    /// Calling it again returns the same report without changing anything.
    pub fn finalize(&mut self) -> Result<GameReport, SessionError> {
        if let Some(report) = &self.report {
            return Ok(report.clone());
        }
        let letters = self.dealt("finalize")?;

        let found: HashSet<&str> = self
            .players
            .values()
            .flat_map(|p| p.found_words().iter().map(String::as_str))
            .collect();
        let missed: Vec<String> = self
            .possible_words
            .iter()
            .filter(|w| !found.contains(w.as_str()))
            .cloned()
            .collect();
        let found_count = found.len();

        let report = GameReport {
            chat_id: self.chat_id,
            letters,
            rankings: self.get_rankings().into_iter().cloned().collect(),
            missed,
            found_count,
            possible_count: self.possible_words.len(),
        };

        self.state = SessionState::Finished;
        self.ended_at = Some(self.ctx.clock.now());
        self.report = Some(report.clone());

        tracing::info!(
            chat_id = self.chat_id,
            found = report.found_count,
            possible = report.possible_count,
            winner = ?report.winner().map(|p| p.display_name.as_str()),
            "Game finished"
        );
        Ok(report)
    }

    pub fn report(&self) -> Option<&GameReport> {
        self.report.as_ref()
    }

    pub fn get_player(&self, user_id: i64) -> Option<&Player> {
        self.players.get(&user_id)
    }

    pub fn has_player(&self, user_id: i64) -> bool {
        self.players.contains_key(&user_id)
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.join_order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    fn ensure_state(&self, action: &'static str, want: SessionState) -> Result<(), SessionError> {
        if self.state != want {
            return Err(SessionError::InvalidState {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Letters of the round in progress.
    fn dealt(&self, action: &'static str) -> Result<Letters, SessionError> {
        self.ensure_state(action, SessionState::Playing)?;
        self.letters.ok_or(SessionError::InvalidState {
            action,
            state: self.state,
        })
    }

    fn ensure_input_open(&self, action: &'static str) -> Result<Letters, SessionError> {
        let letters = self.dealt(action)?;
        if self.time_remaining() == 0 {
            return Err(SessionError::TimeUp);
        }
        Ok(letters)
    }

    /// Snapshot for rendering.
    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players().map(|p| p.to_json()).collect();

        serde_json::json!({
            "chat_id": self.chat_id,
            "mode": self.mode.as_str(),
            "state": self.state.as_str(),
            "letters": self.letters.map(|l| l.to_json()),
            "host_id": self.host_id,
            "players": players,
            "time_remaining": self.time_remaining(),
            "possible_count": self.possible_words.len()
        })
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Cannot {action} while the game is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    #[error("No lobby to join")]
    NotWaiting,

    #[error("You already joined")]
    AlreadyJoined,

    #[error("Only the host can start")]
    NotHost,

    #[error("Need at least {need} players (have {have})")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("Time is up")]
    TimeUp,

    #[error("You are not in this game")]
    UnknownPlayer(i64),

    #[error("Type some letters first")]
    EmptyInput,

    #[error("'{0}' is not a letter")]
    NotALetter(char),

    #[error("No tile at position {0}")]
    NoSuchTile(usize),

    #[error("That tile is already used")]
    TileUsed(usize),

    #[error("No '{0}' tiles left")]
    LetterUsedUp(char),
}
