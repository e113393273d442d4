use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    sync::Arc,
    time::Duration,
};
use tracing::warn;

use typerush::{
    app::{App, TerminalApp},
    app_dirs::AppDirs,
    clock::{SessionClock, ThreadScheduler},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    records::{RecordLog, RecordStore},
    runtime::{CrosstermEventSource, Runner},
    session::{GameSession, SessionConfig},
    storage::{KeyValueStore, MemoryStore, SqliteStore},
    word_source::WordSource,
};

/// How long the loop waits for an event before redrawing anyway
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// timed word-typing game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type as many words as you can before the clock runs out. Words come from a remote word list (with a built-in fallback) and every finished game is added to a local score history."
)]
pub struct Cli {
    /// length of a session in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    secs: Option<u32>,

    /// endpoint returning a JSON array of {"word": ...} records
    #[clap(long)]
    api_url: Option<String>,

    /// seconds to wait for the word endpoint
    #[clap(long)]
    timeout: Option<u64>,

    /// never contact the word endpoint; play with the built-in word list
    #[clap(long)]
    offline: bool,

    /// print the score history and exit
    #[clap(long)]
    history: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command-line values win over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(secs) = self.secs {
            config.session_secs = secs;
        }
        if let Some(url) = &self.api_url {
            config.word_api_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }
        if self.offline {
            config.offline = true;
        }
        config
    }
}

fn open_storage() -> Box<dyn KeyValueStore> {
    match SqliteStore::new() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "could not open storage, history will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

/// Newest first, one record per line
fn format_history(log: &RecordLog) -> String {
    if log.is_empty() {
        return String::from("no games yet");
    }
    log.iter().rev().map(|entry| entry.to_record_string()).join("\n")
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(AppDirs::log_path());

    let config_store = FileConfigStore::default();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    if cli.history {
        let records = RecordStore::new(open_storage());
        writeln!(io::stdout(), "{}", format_history(&records.load_all()))?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, config: &Config) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), POLL_INTERVAL);
    let clock = SessionClock::new(ThreadScheduler::new(runner.sender()));
    let session = GameSession::new(
        SessionConfig::from(config),
        clock,
        RecordStore::new(open_storage()),
    );
    let mut app: TerminalApp = App::new(
        session,
        Arc::new(WordSource::from_config(config)),
        runner.sender(),
    );
    app.boot();

    loop {
        terminal.draw(|f| f.render_widget(&app, f.area()))?;

        if let Some(event) = runner.step() {
            app.handle_event(event);
        }
        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
