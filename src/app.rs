use std::sync::mpsc::Sender;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::clock::{Scheduler, ThreadScheduler};
use crate::records::RecordLog;
use crate::runtime::{spawn_pool_refresh, AppEvent};
use crate::session::{GameEvent, GameSession, Phase};
use crate::storage::KeyValueStore;
use crate::word_source::WordSource;

/// The app as run in a terminal
pub type TerminalApp = App<ThreadScheduler, Box<dyn KeyValueStore>>;

/// Presentation adapter: turns terminal events into session messages and keeps
/// what the screen needs between frames.
pub struct App<S: Scheduler, K: KeyValueStore> {
    session: GameSession<S, K>,
    word_source: Arc<WordSource>,
    tx: Sender<AppEvent>,
    history: RecordLog,
    last_score: Option<u32>,
    refresh_pending: bool,
    start_on_pool: bool,
    should_quit: bool,
}

impl<S: Scheduler, K: KeyValueStore> App<S, K> {
    /// `tx` feeds the same event loop that calls `handle_event`
    pub fn new(session: GameSession<S, K>, word_source: Arc<WordSource>, tx: Sender<AppEvent>) -> Self {
        let history = session.load_history();
        Self {
            session,
            word_source,
            tx,
            history,
            last_score: None,
            refresh_pending: false,
            start_on_pool: false,
            should_quit: false,
        }
    }

    /// Kick off the first pool fetch. Without any pool the first session waits
    /// for it, so the countdown never runs with no word on screen.
    pub fn boot(&mut self) {
        if self.session.has_pool() {
            self.restart_requested();
            return;
        }
        self.start_on_pool = true;
        self.request_pool();
    }

    pub fn session(&self) -> &GameSession<S, K> {
        &self.session
    }

    pub fn history(&self) -> &RecordLog {
        &self.history
    }

    pub fn last_score(&self) -> Option<u32> {
        self.last_score
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// Booted, but the first session is held until words arrive
    pub fn awaiting_pool(&self) -> bool {
        self.start_on_pool
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// The input field now holds `text`
    pub fn user_input(&mut self, text: &str) -> bool {
        let matched = self.session.submit_input(text);
        self.drain_events();
        matched
    }

    /// Start again; a fresh remote attempt is made when only the fallback pool is at hand.
    pub fn restart_requested(&mut self) -> bool {
        if self.session.phase() == Phase::Active || self.start_on_pool {
            return false;
        }
        if self.session.needs_pool() {
            self.request_pool();
        }
        let started = self.session.start();
        self.drain_events();
        started
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize => {}
            AppEvent::Tick(id) => {
                self.session.on_clock_tick(id);
            }
            AppEvent::PoolReady(pool) => {
                self.refresh_pending = false;
                self.session.install_pool(pool);
                if self.start_on_pool {
                    self.start_on_pool = false;
                    self.session.start();
                }
            }
        }
        self.drain_events();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let phase = self.session.phase();
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            KeyCode::Char(c)
                if phase == Phase::Active && !key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                let mut text = self.session.input().to_string();
                text.push(c);
                self.user_input(&text);
            }
            KeyCode::Backspace if phase == Phase::Active => {
                let mut text = self.session.input().to_string();
                if text.pop().is_some() {
                    self.user_input(&text);
                }
            }
            KeyCode::Enter | KeyCode::Char('r') if phase != Phase::Active => {
                self.restart_requested();
            }
            _ => {}
        }
    }

    fn request_pool(&mut self) {
        if self.refresh_pending {
            return;
        }
        debug!("requesting word pool");
        self.refresh_pending = true;
        spawn_pool_refresh(Arc::clone(&self.word_source), self.tx.clone());
    }

    fn drain_events(&mut self) {
        for event in self.session.take_events() {
            match event {
                GameEvent::RecordsChanged(log) => self.history = log,
                GameEvent::GameEnded { score } => self.last_score = Some(score),
                GameEvent::WordChanged(_)
                | GameEvent::ScoreChanged(_)
                | GameEvent::TimeChanged(_)
                | GameEvent::InputChanged(_) => {}
            }
        }
    }
}
