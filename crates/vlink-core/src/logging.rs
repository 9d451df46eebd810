//! Tracing setup for the `vlink` binary.
//!
//! Events go to `$XDG_STATE_HOME/vlink/vlink.log` when that file can be
//! opened for appending, and to stderr otherwise. `RUST_LOG` replaces the
//! default filter.

use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "vlink.log";

const DEFAULT_FILTER: &str = "info,vlink_core=debug,vlink_cli=debug";

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/vlink/vlink.log`, creating the directory if needed.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vlink")?;
    Ok(xdg_dirs.place_state_file(LOG_FILE_NAME)?)
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Never fails: an unusable log file
/// degrades to stderr and the reason is logged there.
pub fn init() -> LogTarget {
    let opened = log_path().and_then(|path| {
        let file = open_log(&path)?;
        Ok((path, file))
    });

    match opened {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                "vlink logging to {}",
                path.display()
            );
            LogTarget::File(path)
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .with_ansi(false)
                .init();
            tracing::debug!("log file unavailable ({:#}), using stderr", err);
            LogTarget::Stderr
        }
    }
}
