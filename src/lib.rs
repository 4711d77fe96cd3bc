//! bagsweep - Bulk Bag Discovery and Validation
//!
//! A tool for verifying trees of archival bags against their checksum
//! manifests, producing a classified, timestamped validation report.
//!
//! # Features
//!
//! - **Pruned Discovery**: Walks a tree for bag roots, skipping hidden
//!   directories and never descending into a found bag's internals.
//!
//! - **Parallel Hashing**: Each bag check streams its files through a
//!   fixed pool of hasher threads.
//!
//! - **Classified Outcomes**: Every discrepancy maps into a closed
//!   taxonomy - checksum mismatch, missing file, unexpected file,
//!   structural error, system error - and one broken bag never aborts
//!   a bulk run.
//!
//! - **Dual Report Sinks**: Identical timestamped, leveled lines go to
//!   the console and a date-named log file in the working directory.
//!
//! # Architecture
//!
//! ```text
//!  -w tree root ──▶ BagLocator ──▶ discovered bag paths ─┐
//!  -f path list ──────────────────────────────────────────┼──▶ BulkRunner
//!  -s single bag ─────────────────────────────────────────┘        │
//!                                                                  ▼
//!                                                       BagValidator (per bag)
//!                                                          │             │
//!                                              Bag engine  │             │ report lines
//!                                       (manifests + hash  ▼             ▼
//!                                        worker pool)   ValidationReport  ReportSink
//!                                                                        (log + console)
//! ```
//!
//! # Example
//!
//! ```bash
//! # Walk a tree and validate every bag under it
//! bagsweep -w /archive/deposits
//!
//! # Validate a list of bags with 16 hasher threads
//! bagsweep -f to_check.txt -p 16
//! ```

pub mod bag;
pub mod config;
pub mod error;
pub mod finder;
pub mod progress;
pub mod report;
pub mod validate;

pub use config::{CliArgs, RunConfig, RunMode};
pub use error::{Result, SweepError};
pub use finder::{BagLocator, HiddenPathFilter};
pub use report::ReportSink;
pub use validate::{BagValidator, BulkRunner, ValidationOutcome, ValidationReport};
