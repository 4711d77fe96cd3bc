//! Validation outcomes, the per-bag validator, and the bulk runner
//!
//! The validator is the boundary where engine conditions become a closed
//! outcome taxonomy. Nothing raised while checking one bag escapes it:
//! structural and OS-level failures are converted to outcomes and report
//! lines, so one broken bag cannot abort a bulk run.

use crate::bag::{Algorithm, Bag, Discrepancy};
use crate::error::BagError;
use crate::progress::ProgressReporter;
use crate::report::ReportSink;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One classified validation result
///
/// Immutable once produced. Each non-Valid variant carries enough data to
/// render a precise diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    ChecksumMismatch {
        path: PathBuf,
        algorithm: Algorithm,
        expected: String,
        found: String,
    },
    MissingFile {
        path: PathBuf,
    },
    UnexpectedFile {
        path: PathBuf,
    },
    StructuralError {
        message: String,
    },
    SystemError {
        path: PathBuf,
        message: String,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// System-level outcomes are reported at CRITICAL, everything else
    /// at ERROR
    pub fn is_system(&self) -> bool {
        matches!(self, ValidationOutcome::SystemError { .. })
    }

    fn from_discrepancy(discrepancy: Discrepancy) -> Self {
        match discrepancy {
            Discrepancy::Digest {
                path,
                algorithm,
                expected,
                found,
            } => ValidationOutcome::ChecksumMismatch {
                path,
                algorithm,
                expected,
                found,
            },
            Discrepancy::Missing { path } => ValidationOutcome::MissingFile { path },
            Discrepancy::Unexpected { path } => ValidationOutcome::UnexpectedFile { path },
            Discrepancy::Unreadable { path, reason } => ValidationOutcome::SystemError {
                path,
                message: reason,
            },
            Discrepancy::Oxum { expected, found } => ValidationOutcome::StructuralError {
                message: format!(
                    "Payload-Oxum {expected} does not match on-disk payload {found}"
                ),
            },
        }
    }

    fn from_open_error(error: BagError) -> Self {
        match error {
            BagError::Io { path, source } => ValidationOutcome::SystemError {
                path,
                message: source.to_string(),
            },
            other => ValidationOutcome::StructuralError {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Valid => f.write_str("valid"),
            ValidationOutcome::ChecksumMismatch {
                path,
                algorithm,
                expected,
                found,
            } => write!(
                f,
                "Expected {} to have {} checksum of {} but found {}",
                path.display(),
                algorithm,
                expected,
                found
            ),
            ValidationOutcome::MissingFile { path } => {
                write!(f, "The expected file {} is missing", path.display())
            }
            ValidationOutcome::UnexpectedFile { path } => {
                write!(
                    f,
                    "Found a file {} that is not in the manifest",
                    path.display()
                )
            }
            ValidationOutcome::StructuralError { message } => f.write_str(message),
            ValidationOutcome::SystemError { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

/// Validation result for one bag
#[derive(Debug, Clone)]
pub struct BagReport {
    /// The bag path, exactly as it was handed to the validator
    pub path: PathBuf,

    /// Outcome list; empty means the bag is valid
    pub outcomes: Vec<ValidationOutcome>,

    /// On-disk payload file count
    pub payload_files: u64,

    /// On-disk payload byte total
    pub payload_bytes: u64,
}

impl BagReport {
    /// Valid iff the outcome list is empty or contains only Valid
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(ValidationOutcome::is_valid)
    }
}

/// Ordered validation results for one run
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// One report per input path, in input order
    pub bags: Vec<BagReport>,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.bags.iter().filter(|b| b.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.bags.len() - self.valid_count()
    }

    pub fn total_payload_files(&self) -> u64 {
        self.bags.iter().map(|b| b.payload_files).sum()
    }

    pub fn total_payload_bytes(&self) -> u64 {
        self.bags.iter().map(|b| b.payload_bytes).sum()
    }
}

/// Validates one bag and maps engine conditions into outcomes
///
/// Dual contract: every discrepancy is returned as structured data and
/// emitted as a report line at time of detection.
pub struct BagValidator<'a> {
    sink: &'a ReportSink,
    processes: usize,
}

impl<'a> BagValidator<'a> {
    /// `processes` is the hasher thread count used inside each bag check
    pub fn new(sink: &'a ReportSink, processes: usize) -> Self {
        Self { sink, processes }
    }

    /// Validate the bag at `path`.
    ///
    /// Trusts the caller that `path` is meant to be a bag; a path that
    /// is not one resolves to a structural or system outcome. Never
    /// returns an error.
    pub fn validate(&self, path: &Path) -> BagReport {
        self.sink
            .info(&format!("VALIDATING: \t{}", path.display()));

        let bag = match Bag::open(path) {
            Ok(bag) => bag,
            Err(e) => {
                let outcome = ValidationOutcome::from_open_error(e);
                return self.finish_invalid(path, vec![outcome], 0, 0);
            }
        };

        let verification = bag.verify(self.processes);
        if verification.is_valid() {
            self.sink.info(&format!("VALID: \t{}", path.display()));
            return BagReport {
                path: path.to_path_buf(),
                outcomes: Vec::new(),
                payload_files: verification.payload_files,
                payload_bytes: verification.payload_bytes,
            };
        }

        let outcomes = verification
            .discrepancies
            .into_iter()
            .map(ValidationOutcome::from_discrepancy)
            .collect();
        self.finish_invalid(
            path,
            outcomes,
            verification.payload_files,
            verification.payload_bytes,
        )
    }

    fn finish_invalid(
        &self,
        path: &Path,
        outcomes: Vec<ValidationOutcome>,
        payload_files: u64,
        payload_bytes: u64,
    ) -> BagReport {
        for outcome in &outcomes {
            if outcome.is_system() {
                self.sink.critical(&outcome.to_string());
            } else {
                self.sink.error(&outcome.to_string());
            }
        }
        self.sink
            .error(&format!("Bag validation failed: {}", path.display()));
        self.sink.info(&format!("INVALID: \t{}", path.display()));

        BagReport {
            path: path.to_path_buf(),
            outcomes,
            payload_files,
            payload_bytes,
        }
    }
}

/// Runs the validator over a sequence of bag paths
///
/// Single-path mode, file-list mode, and walk mode all feed this one
/// entry point. Iteration is sequential; report order equals input
/// order, and every input path resolves to exactly one report.
pub struct BulkRunner<'a> {
    validator: BagValidator<'a>,
    progress: Option<&'a ProgressReporter>,
}

impl<'a> BulkRunner<'a> {
    pub fn new(validator: BagValidator<'a>) -> Self {
        Self {
            validator,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(&self, paths: &[PathBuf]) -> ValidationReport {
        let start = Instant::now();

        let mut bags = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            if let Some(progress) = self.progress {
                progress.set_status(&format!(
                    "Validating {}/{}: {}",
                    idx + 1,
                    paths.len(),
                    path.display()
                ));
            }
            bags.push(self.validator.validate(path));
        }

        ValidationReport {
            bags,
            duration: start.elapsed(),
        }
    }
}
