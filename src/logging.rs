//! File logging for perch.
//!
//! The terminal belongs to the chat UI, so all `tracing` output goes to
//! `<cache_dir>/perch/perch.log`. Each start rotates the previous logs
//! (`perch.log` → `perch.log.1` → … → `perch.log.3`).

use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR, LOG_FILENAME, LOG_KEEP};

/// Installs the global subscriber and returns the active log file path.
pub fn init() -> Result<PathBuf> {
    let log_dir = Config::cache_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
    let log_path = log_dir.join(LOG_FILENAME);

    rotate_log_file(&log_path, LOG_KEEP);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "perch starting"
    );
    Ok(log_path)
}

/// `PERCH_LOG`, then `RUST_LOG`, then the built-in default.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Rotate log files: `perch.log` → `perch.log.1` → `.2` → … → `.{keep}`.
///
/// The oldest file beyond `keep` is deleted. Missing files in the chain are
/// skipped.
pub fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A writer that wraps a [`File`] and flushes after every write, so the
/// log is complete even if the process dies abruptly.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<Mutex<File>>,
}

impl FlushingWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))?;
        let n = f.write(buf)?;
        f.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))?;
        f.flush()
    }
}

impl<'a> MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
