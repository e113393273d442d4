use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Route `tracing` output to a file. The terminal belongs to the TUI, so when no
/// file can be opened logging is switched off instead. Returns the file in use.
pub fn init(path: Option<PathBuf>) -> Option<PathBuf> {
    let opened = path.and_then(|p| open_log_file(&p).ok().map(|file| (p, file)));

    match opened {
        Some((path, file)) => {
            let installed = tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter())
                .try_init()
                .is_ok();
            if installed {
                tracing::info!(path = %path.display(), "logging initialized");
            }
            Some(path)
        }
        None => None,
    }
}
