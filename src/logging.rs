//! Per-session log file setup.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoLocal;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file name for a session started at `now`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("monitoring_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Log level from the command line flags.
/// Default is INFO. Use -v for debug, -vv for trace, -q for errors only.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Creates `log_dir` if needed and opens a fresh session log inside it.
pub fn create_log_file(log_dir: &Path, now: DateTime<Local>) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file_name(now));
    let file = File::options().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Initializes the tracing subscriber writing to a new file in `log_dir`.
///
/// Returns the path of the log file.
pub fn init(log_dir: &Path, verbose: u8, quiet: bool) -> io::Result<PathBuf> {
    let (path, file) = create_log_file(log_dir, Local::now())?;

    let directive: Directive = format!("hostwatch={}", level_for(verbose, quiet))
        .parse()
        .map_err(io::Error::other)?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}
