//! Run log setup.
//!
//! Every event goes to two places: the terminal (warnings and errors
//! on stderr, the rest on stdout) and a per-run file named
//! `deploy_<YYYYMMDD_HHMMSS>.log`.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{DeployError, DeployResult};

/// Keeps the file writer alive; dropping it flushes the log.
pub struct RunLog {
    pub path: PathBuf,
    _guard: WorkerGuard,
}

#[must_use]
pub fn log_file_name(started: NaiveDateTime) -> String {
    started.format("deploy_%Y%m%d_%H%M%S.log").to_string()
}

/// Install the global subscriber. The filter follows `RUST_LOG` and
/// defaults to `info`.
pub fn init_logging(dir: &Path) -> DeployResult<RunLog> {
    let name = log_file_name(Local::now().naive_local());
    let stem = name.trim_end_matches(".log");

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(stem)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| DeployError::Other(format!("cannot create run log in {}: {e}", dir.display())))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let terminal = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr.with_max_level(Level::WARN).or_else(std::io::stdout));

    let file = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(terminal)
        .with(file)
        .try_init()
        .map_err(|e| DeployError::Other(e.to_string()))?;

    Ok(RunLog {
        path: dir.join(name),
        _guard: guard,
    })
}
