//! Tracing subscriber initialization.
//!
//! Logs go to stderr in human-readable form and, once a run directory
//! exists, to `combined.log` (every event) and `error.log` (errors only) as
//! JSON lines. The subscriber is installed before the run directory is known;
//! file layers discard events until [`LogFiles::attach`] opens their files.
//!
//! Filter priority: `RUST_LOG`, then `--verbose` (debug), then `info`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// All events of a run.
pub const COMBINED_LOG: &str = "combined.log";
/// Error events of a run.
pub const ERROR_LOG: &str = "error.log";

/// A log file opened after the subscriber is installed.
#[derive(Clone, Default)]
struct DeferredFile {
    file: Arc<Mutex<Option<File>>>,
}

impl DeferredFile {
    fn open(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if let Ok(mut slot) = self.file.lock() {
            *slot = Some(file);
        }
        Ok(())
    }
}

impl io::Write for DeferredFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(file) => file.write(buf),
                None => Ok(buf.len()),
            },
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(file) => file.flush(),
                None => Ok(()),
            },
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for DeferredFile {
    type Writer = DeferredFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Handle on the per-run log files.
#[derive(Clone, Default)]
pub struct LogFiles {
    combined: DeferredFile,
    errors: DeferredFile,
}

impl LogFiles {
    /// Starts writing `combined.log` and `error.log` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if either file cannot be opened.
    pub fn attach(&self, dir: &Path) -> Result<()> {
        let combined = dir.join(COMBINED_LOG);
        self.combined
            .open(&combined)
            .map_err(|e| Error::artifact(&combined, e))?;

        let errors = dir.join(ERROR_LOG);
        self.errors
            .open(&errors)
            .map_err(|e| Error::artifact(&errors, e))?;
        Ok(())
    }
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    })
}

/// Installs the global subscriber and returns the handle used to attach the
/// run's log files. A second call leaves the first subscriber in place.
pub fn init(verbose: bool) -> LogFiles {
    let files = LogFiles::default();

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    let combined = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(files.combined.clone());
    let errors = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(files.errors.clone())
        .with_filter(LevelFilter::ERROR);

    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbose))
        .with(console)
        .with(combined)
        .with(errors)
        .try_init();

    files
}
