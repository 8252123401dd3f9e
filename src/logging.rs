//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from `RUST_LOG` when it is set, otherwise from the
//! `--quiet`/`--verbose` flags (info by default).
//!
//! Records go to stderr for `qrscan decode`. While the TUI owns the
//! terminal anything on stderr would tear the screen, so `qrscan scan`
//! appends to a log file instead ([`LogTarget::File`]). File records always
//! carry a full timestamp; stderr records only do in debug builds or with
//! `-v`.
//!
//! ```rust,no_run
//! use qrscan::logging::{init_logging, LogTarget};
//!
//! init_logging(0, false, LogTarget::Stderr);
//! log::info!("ready");
//! ```

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use env_logger::{Builder, Target, WriteStyle};
use log::{LevelFilter, Record};

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error (headless commands).
    Stderr,
    /// Append to a file (interactive TUI).
    File(PathBuf),
}

/// Install the global logger.
///
/// If the log file cannot be opened, records fall back to stderr. Only the
/// first call in a process installs a logger; later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool, target: LogTarget) {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match &from_env {
        Some(spec) => {
            builder.parse_filters(spec);
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }

    let to_file = match &target {
        LogTarget::File(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .target(Target::Pipe(Box::new(file)))
                    .write_style(WriteStyle::Never);
                true
            }
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                false
            }
        },
        LogTarget::Stderr => false,
    };

    let detailed = to_file || verbose > 0 || cfg!(debug_assertions);
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if detailed {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                short_target(record),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_err() {
        return;
    }

    match from_env {
        Some(spec) => log::debug!("Log filter from RUST_LOG: {}", spec),
        None => log::debug!("Log level: {}", current_level_name()),
    }
}

/// Level selected by the CLI flags. `quiet` wins over any `verbose` count.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Module path without the crate prefix (`session::controller`).
fn short_target<'a>(record: &Record<'a>) -> &'a str {
    let target = record.module_path().unwrap_or_else(|| record.target());
    target
        .strip_prefix("qrscan::")
        .unwrap_or(target)
}

/// Name of the active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
