//! Configuration types for bagsweep
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Path-list loading for `-f` mode

use crate::error::ConfigError;
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

/// Default hasher thread count per bag check
pub const DEFAULT_PROCESSES: usize = 8;

/// Maximum reasonable hasher thread count
const MAX_PROCESSES: usize = 128;

/// Bulk bag validator with timestamped report logging
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bagsweep",
    version,
    about = "Bulk bag discovery and validation with timestamped reports",
    long_about = "Validates bags against their checksum manifests and writes a timestamped\n\
                  validation report log to the current working directory.\n\n\
                  Bags are identified by a bagit.txt declaration at their top level.",
    after_help = "EXAMPLES:\n    \
        bagsweep -w /archive/deposits\n    \
        bagsweep -s /archive/deposits/bag_0001\n    \
        bagsweep -f to_check.txt -p 16",
    group(ArgGroup::new("mode").required(true).args(["paths_file", "walk_root", "single_bag"]))
)]
pub struct CliArgs {
    /// Plain text file with one bag path per line, validated in file order
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub paths_file: Option<PathBuf>,

    /// Tree root to walk; every bag discovered underneath is validated
    #[arg(short = 'w', long = "walk", value_name = "PATH")]
    pub walk_root: Option<PathBuf>,

    /// Single bag root to validate
    #[arg(short = 's', long = "single", value_name = "PATH")]
    pub single_bag: Option<PathBuf>,

    /// Worker threads for per-file checksum hashing
    #[arg(
        short = 'p',
        long,
        default_value_t = DEFAULT_PROCESSES,
        value_name = "NUM"
    )]
    pub processes: usize,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose diagnostics (walk and hashing details)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// How the run selects bags to validate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Validate each path listed in a text file, in file order
    FileList(PathBuf),

    /// Walk a tree root and validate every discovered bag
    Walk(PathBuf),

    /// Validate one explicit bag root
    Single(PathBuf),
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Bag selection mode
    pub mode: RunMode,

    /// Hasher thread count per bag check
    pub processes: usize,

    /// Show progress spinner and console header/summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.processes == 0 || args.processes > MAX_PROCESSES {
            return Err(ConfigError::InvalidProcessCount {
                count: args.processes,
                max: MAX_PROCESSES,
            });
        }

        let mode = match (args.paths_file, args.walk_root, args.single_bag) {
            (Some(file), None, None) => RunMode::FileList(file),
            (None, Some(root), None) => RunMode::Walk(root),
            (None, None, Some(bag)) => RunMode::Single(bag),
            _ => return Err(ConfigError::ModeRequired),
        };

        Ok(Self {
            mode,
            processes: args.processes,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Read a `-f` path list: one bag path per line, blank lines skipped,
/// surrounding whitespace trimmed
pub fn load_path_list(path: &Path) -> crate::error::Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}
