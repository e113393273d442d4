// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod ui;
pub mod word_source;

pub use app::{App, TerminalApp};
pub use session::{GameEvent, GameSession, Phase};
