//! Error types for bagsweep
//!
//! This module defines the error hierarchy covering:
//! - Configuration and CLI errors
//! - Report log creation and write errors
//! - Structural errors raised by the bag engine
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Per-bag failures never escape the validator as errors; they are
//!   converted to validation outcomes so one bag cannot abort a bulk run
//! - Argument, configuration, and report-setup failures are the only
//!   fatal paths

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the bagsweep application
#[derive(Error, Debug)]
pub enum SweepError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report sink errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Bag structure errors
    #[error("Bag error: {0}")]
    Bag(#[from] BagError),

    /// I/O errors (path-list reading, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid hashing process count
    #[error("Invalid process count {count}: must be between 1 and {max}")]
    InvalidProcessCount { count: usize, max: usize },

    /// No run mode selected
    #[error("One of -f, -w or -s is required")]
    ModeRequired,
}

/// Report log errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// Failed to create the report log file
    #[error("Failed to create report log '{path}': {reason}")]
    Create { path: PathBuf, reason: String },

    /// Failed to write or flush a report line
    #[error("Failed to write report line: {0}")]
    Write(#[from] std::io::Error),
}

/// Structural conditions raised by the bag engine
///
/// These describe a bag whose static structure cannot be parsed at all.
/// Per-file problems found during verification are not errors; they are
/// returned as discrepancies.
#[derive(Error, Debug)]
pub enum BagError {
    /// The given path is not a directory
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// No bagit.txt declaration at the top level
    #[error("Missing bagit.txt declaration in '{path}'")]
    MissingDeclaration { path: PathBuf },

    /// The declaration exists but cannot be parsed
    #[error("Invalid bagit.txt declaration in '{path}': {reason}")]
    InvalidDeclaration { path: PathBuf, reason: String },

    /// No payload manifest (manifest-<algorithm>.txt) found
    #[error("No payload manifest found in '{path}'")]
    NoManifest { path: PathBuf },

    /// A manifest names a checksum algorithm the engine does not support
    #[error("Unsupported checksum algorithm '{algorithm}'")]
    UnsupportedAlgorithm { algorithm: String },

    /// A manifest line does not parse
    #[error("Malformed manifest line {line} in '{file}': {reason}")]
    ManifestLine {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    /// A manifest entry points outside the bag
    #[error("Manifest entry '{entry}' in '{file}' escapes the bag payload")]
    UnsafePath { file: PathBuf, entry: String },

    /// OS-level failure reading the bag's tag files
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BagError {
    /// Check if this error is an OS-level access failure rather than a
    /// defect in the bag's structure
    pub fn is_system(&self) -> bool {
        matches!(self, BagError::Io { .. })
    }
}

/// Result type alias for SweepError
pub type Result<T> = std::result::Result<T, SweepError>;
