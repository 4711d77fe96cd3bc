//! Bag discovery walk
//!
//! Breadth-first traversal with an explicit frontier. At each directory:
//!
//! 1. Hidden directories are never entered and never scanned.
//! 2. Child directories are filtered for hiddenness before they join the
//!    frontier, so hidden subtrees cost nothing.
//! 3. A directory with a bag declaration as a direct child is recorded as
//!    a bag and none of its children join the frontier - a bag's internal
//!    structure is never searched for nested bags.
//! 4. Siblings continue to be scanned whether or not a bag was found.
//!
//! Directory read failures are logged and skipped; the walk never aborts.

use crate::bag::DECLARATION_NAME;
use crate::finder::hidden::HiddenPathFilter;
use crate::progress::ProgressReporter;
use crate::report::ReportSink;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locates bag roots under a tree root
pub struct BagLocator<'a> {
    hidden: &'a dyn HiddenPathFilter,
    sink: &'a ReportSink,
    progress: Option<&'a ProgressReporter>,
}

impl<'a> BagLocator<'a> {
    pub fn new(hidden: &'a dyn HiddenPathFilter, sink: &'a ReportSink) -> Self {
        Self {
            hidden,
            sink,
            progress: None,
        }
    }

    /// Attach a progress reporter updated as directories are scanned
    pub fn with_progress(mut self, progress: &'a ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Walk the tree under `root` and return every discovered bag root,
    /// in discovery order. Returns an empty set, not an error, when no
    /// bags are found or the root cannot be read.
    pub fn find(&self, root: &Path) -> Vec<PathBuf> {
        self.sink
            .info(&format!("Scanning {} for bags.", root.display()));

        let root = match fs::canonicalize(root) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "Cannot resolve scan root");
                return Vec::new();
            }
        };

        let mut bags = Vec::new();
        let mut frontier = VecDeque::new();
        frontier.push_back(root);

        while let Some(dir) = frontier.pop_front() {
            if self.hidden.is_hidden(&dir) {
                debug!(path = %dir.display(), "Skipping hidden directory");
                continue;
            }

            if let Some(progress) = self.progress {
                progress.set_status(&format!("Scanning {}", dir.display()));
            }

            let scan = match self.scan_dir(&dir) {
                Ok(scan) => scan,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Failed to read directory, skipping");
                    continue;
                }
            };

            if scan.has_declaration {
                self.sink.info(&format!("Found a bag {}", dir.display()));
                bags.push(dir);
                // Prune: only this bag's children stay out of the frontier.
                continue;
            }

            frontier.extend(scan.subdirs);
        }

        bags
    }

    /// Read one directory, returning its visible subdirectories and
    /// whether it carries the bag declaration as a direct child.
    fn scan_dir(&self, dir: &Path) -> io::Result<DirScan> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    debug!(path = %dir.display(), error = %e, "Unreadable directory entry, skipping");
                }
            }
        }
        // Deterministic discovery order within a run.
        entries.sort_by_key(|entry| entry.file_name());

        let mut scan = DirScan::default();
        for entry in entries {
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Cannot determine entry type, skipping");
                    continue;
                }
            };

            if file_type.is_dir() {
                // Symlinked directories are not followed, so a link back
                // to an ancestor cannot loop the walk.
                let child = entry.path();
                if !self.hidden.is_hidden(&child) {
                    scan.subdirs.push(child);
                }
            } else if file_type.is_file() && entry.file_name() == DECLARATION_NAME {
                scan.has_declaration = true;
            }
        }

        Ok(scan)
    }
}

#[derive(Default)]
struct DirScan {
    subdirs: Vec<PathBuf>,
    has_declaration: bool,
}
