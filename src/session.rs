use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clock::{ClockId, Scheduler, SessionClock};
use crate::config::{Config, DEFAULT_SESSION_SECS};
use crate::records::{RecordEntry, RecordLog, RecordStore};
use crate::storage::KeyValueStore;
use crate::word_source::{next_word, WordPool};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            session_secs: cfg.session_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Active,
    Ended,
}

/// Changes the presentation layer needs to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    WordChanged(String),
    ScoreChanged(u32),
    TimeChanged(u32),
    InputChanged(String),
    GameEnded { score: u32 },
    RecordsChanged(RecordLog),
}

/// Everything that changes during play. Only `GameSession` mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    current_word: Option<String>,
    score: u32,
    time_remaining: u32,
    phase: Phase,
    input: String,
}

impl GameState {
    fn idle(session_secs: u32) -> Self {
        Self {
            current_word: None,
            score: 0,
            time_remaining: session_secs,
            phase: Phase::Idle,
            input: String::new(),
        }
    }

    /// `None` until a word pool has arrived
    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

/// The game's state machine: Idle -> Active -> Ended -> Active -> ...
#[derive(Debug)]
pub struct GameSession<S: Scheduler, K: KeyValueStore> {
    config: SessionConfig,
    state: GameState,
    pool: Option<WordPool>,
    clock: SessionClock<S>,
    records: RecordStore<K>,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl<S: Scheduler, K: KeyValueStore> GameSession<S, K> {
    pub fn new(config: SessionConfig, clock: SessionClock<S>, records: RecordStore<K>) -> Self {
        Self {
            state: GameState::idle(config.session_secs),
            config,
            pool: None,
            clock,
            records,
            rng: StdRng::from_entropy(),
            events: Vec::new(),
        }
    }

    /// Deterministic word draws, for tests and replays
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.state.time_remaining
    }

    pub fn current_word(&self) -> Option<&str> {
        self.state.current_word()
    }

    pub fn input(&self) -> &str {
        &self.state.input
    }

    pub fn clock(&self) -> &SessionClock<S> {
        &self.clock
    }

    /// Drain the events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stored history, for the startup screen
    pub fn load_history(&self) -> RecordLog {
        self.records.load_all()
    }

    pub fn has_pool(&self) -> bool {
        self.pool.is_some()
    }

    /// True when there is no pool yet, or only the fallback list
    pub fn needs_pool(&self) -> bool {
        self.pool.as_ref().map_or(true, WordPool::is_fallback)
    }

    /// Begin a session from Idle or Ended. Returns false (and changes nothing) while Active.
    pub fn start(&mut self) -> bool {
        if self.state.phase == Phase::Active {
            return false;
        }

        self.state.score = 0;
        self.state.time_remaining = self.config.session_secs;
        self.state.input.clear();
        self.state.current_word = self.pool.as_ref().map(|pool| next_word(pool, &mut self.rng));
        self.clock.start();
        self.state.phase = Phase::Active;

        info!(
            secs = self.config.session_secs,
            has_word = self.state.current_word.is_some(),
            "session started"
        );

        self.events.push(GameEvent::ScoreChanged(0));
        self.events
            .push(GameEvent::TimeChanged(self.state.time_remaining));
        self.events.push(GameEvent::InputChanged(String::new()));
        if let Some(word) = &self.state.current_word {
            self.events.push(GameEvent::WordChanged(word.clone()));
        }
        true
    }

    /// Feed the full contents of the input field. Returns true on an exact match.
    ///
    /// Ignored unless Active with a word in play. A non-matching text just becomes
    /// the input buffer.
    pub fn submit_input(&mut self, text: &str) -> bool {
        if self.state.phase != Phase::Active {
            return false;
        }
        let Some(word) = self.state.current_word.as_deref() else {
            return false;
        };

        if text == word {
            self.state.score += 1;
            self.state.input.clear();
            let next = self
                .pool
                .as_ref()
                .map(|pool| next_word(pool, &mut self.rng));
            if let Some(next) = next {
                self.state.current_word = Some(next);
            }

            self.events.push(GameEvent::ScoreChanged(self.state.score));
            self.events.push(GameEvent::InputChanged(String::new()));
            if let Some(word) = &self.state.current_word {
                self.events.push(GameEvent::WordChanged(word.clone()));
            }
            true
        } else {
            if self.state.input != text {
                self.state.input = text.to_string();
                self.events.push(GameEvent::InputChanged(self.state.input.clone()));
            }
            false
        }
    }

    /// One second passes. The session ends on the tick that brings time to zero.
    pub fn tick(&mut self) {
        if self.state.phase != Phase::Active {
            return;
        }

        if self.state.time_remaining > 0 {
            self.state.time_remaining -= 1;
            self.events
                .push(GameEvent::TimeChanged(self.state.time_remaining));
        }

        if self.state.time_remaining == 0 {
            self.end();
        }
    }

    /// Tick only if it comes from the live clock. Returns whether it was applied.
    pub fn on_clock_tick(&mut self, id: ClockId) -> bool {
        if !self.clock.is_current(id) {
            debug!(clock = id.get(), "dropping stale tick");
            return false;
        }
        self.tick();
        true
    }

    /// Swap in a new pool. The word already in play stays.
    pub fn install_pool(&mut self, pool: WordPool) {
        debug!(words = pool.len(), fallback = pool.is_fallback(), "installing word pool");
        self.pool = Some(pool);

        if self.state.phase == Phase::Active && self.state.current_word.is_none() {
            let word = self
                .pool
                .as_ref()
                .map(|pool| next_word(pool, &mut self.rng));
            if let Some(word) = word {
                self.events.push(GameEvent::WordChanged(word.clone()));
                self.state.current_word = Some(word);
            }
        }
    }

    fn end(&mut self) {
        self.clock.cancel();
        self.state.phase = Phase::Ended;
        let score = self.state.score;

        let entry = RecordEntry::now(score);
        if let Err(err) = self.records.append(&entry) {
            warn!(error = %err, "could not save record");
        }
        let history = self.records.load_all();

        info!(score, records = history.len(), "session ended");

        self.events.push(GameEvent::GameEnded { score });
        self.events.push(GameEvent::RecordsChanged(history));
    }
}
