//! Timestamped, leveled validation report sink
//!
//! The sink is constructed once per run and passed by reference to every
//! component that reports. Two destinations receive identical lines: a
//! date-named log file in the working directory and stdout. Writes are
//! line-atomic so concurrent reporters cannot interleave partial lines.
//!
//! Line format: `<LEVEL>: <timestamp> <message>`

use crate::error::ReportError;
use chrono::{DateTime, Datelike, Local};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Report line severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Lifecycle milestones (VALIDATING / VALID / INVALID)
    Info,
    /// One line per discrepancy plus the package-level failure summary
    Error,
    /// Unexpected or system-level failures
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// Report log file name for the given date: `<YYYY><MM><DD>_validation_report.log`
pub fn log_file_name(date: &DateTime<Local>) -> String {
    format!(
        "{}{:02}{:02}_validation_report.log",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Dual-destination report sink (log file + console)
pub struct ReportSink {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl ReportSink {
    /// Open the report log in `dir`, named for the date of run start.
    /// The file is opened in append mode, so runs on the same day share
    /// one log.
    pub fn open(dir: &Path) -> Result<Self, ReportError> {
        let path = dir.join(log_file_name(&Local::now()));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ReportError::Create {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Path of the report log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Emit one line to both destinations.
    ///
    /// A failed file write is reported to the diagnostic channel and the
    /// run continues; validation outcomes are never lost to a sink error.
    pub fn emit(&self, level: Level, message: &str) {
        let line = format!(
            "{}: {} {}",
            level,
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            message
        );

        // Hold the file lock across both destinations so lines from
        // concurrent reporters cannot interleave.
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(error = %e, "Failed to write report line to log file");
        }
        let mut console = io::stdout().lock();
        let _ = writeln!(console, "{line}");
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.emit(Level::Critical, message);
    }

    /// Flush both destinations at the end of a run
    pub fn finish(&self) -> Result<(), ReportError> {
        self.file.lock().flush()?;
        io::stdout().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_log_file_name_zero_padded() {
        let date = Local.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(log_file_name(&date), "20240307_validation_report.log");

        let date = Local.with_ymd_and_hms(2024, 11, 23, 10, 0, 0).unwrap();
        assert_eq!(log_file_name(&date), "20241123_validation_report.log");
    }

    #[test]
    fn test_emit_writes_leveled_line() {
        let dir = tempdir().unwrap();
        let sink = ReportSink::open(dir.path()).unwrap();

        sink.info("VALIDATING: \t/archive/bag_0001");
        sink.error("The expected file data/a.txt is missing");
        sink.critical("permission denied");
        sink.finish().unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("INFO: "));
        assert!(lines[0].ends_with("VALIDATING: \t/archive/bag_0001"));
        assert!(lines[1].starts_with("ERROR: "));
        assert!(lines[2].starts_with("CRITICAL: "));
    }

    #[test]
    fn test_open_appends_to_existing_log() {
        let dir = tempdir().unwrap();

        let sink = ReportSink::open(dir.path()).unwrap();
        sink.info("first run");
        sink.finish().unwrap();

        let sink = ReportSink::open(dir.path()).unwrap();
        sink.info("second run");
        sink.finish().unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
