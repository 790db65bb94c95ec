//! Per-run diagnostic log file.
//!
//! Each run writes `<stem>.log` next to the source document with one line
//! per synthesised prompt and per illustration warning:
//!
//! ```text
//! 2026-10-19 14:03:11 - INFO - A watercolor of a lighthouse at dusk
//! 2026-10-19 14:03:40 - WARNING - Prompt did not work for page 3: image service returned HTTP 400
//! ```
//!
//! The handle is created by [`crate::convert`] and passed explicitly to each
//! component. Every entry is mirrored to `tracing` so it also reaches the
//! process-wide subscriber.

use crate::error::PikbookError;
use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Severity of a [`RunLog`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
        }
    }
}

/// Handle to the diagnostic log of one run.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl RunLog {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PikbookError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| PikbookError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: &str) {
        info!("{}", message);
        self.write(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        warn!("{}", message);
        self.write(LogLevel::Warning, message);
    }

    /// Append one timestamped line. A failing log write never aborts a run.
    fn write(&self, level: LogLevel, message: &str) {
        let line = format_line(chrono::Local::now(), level, message);
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{line}") {
            warn!("Failed to write run log {}: {}", self.path.display(), e);
        }
    }
}

fn format_line<Tz>(at: chrono::DateTime<Tz>, level: LogLevel, message: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} - {} - {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        level.as_str(),
        message
    )
}
