//! Log file setup
//!
//! The full-screen UI owns the terminal, so log lines go to a file. The
//! filter comes from `CORE_LIMITER_LOG` (tracing `EnvFilter` syntax) and
//! defaults to `info`.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::constants::LOG_FILTER_ENV;

/// Starts logging to `path`, appending to an existing file.
pub fn init(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    tracing::info!(log = %path.display(), "logging started");
    Ok(())
}
