//! Progress reporting and console output
//!
//! A spinner shows live status while discovery and validation run; the
//! header and summary frame the run on the console. All of it is
//! cosmetic and suppressed by quiet mode - the validation report lines
//! go through the report sink, not here.

use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Spinner showing the path currently being scanned or validated
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set the status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Print a header at the start of the run
pub fn print_header(target: &str, processes: usize, report_path: &Path) {
    println!();
    println!(
        "{} {}",
        style("bagsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Target:").bold(), target);
    println!("  {} {}", style("Hashers:").bold(), processes);
    println!("  {} {}", style("Report:").bold(), report_path.display());
    println!();
}

/// Print a summary of the run results
pub fn print_summary(
    bags: usize,
    valid: usize,
    invalid: usize,
    payload_files: u64,
    payload_bytes: u64,
    duration: Duration,
    report_path: &Path,
) {
    println!();
    println!("{}", style("Validation Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Bags:").bold(), format_number(bags as u64));
    println!(
        "  {} {}",
        style("Valid:").bold(),
        format_number(valid as u64)
    );
    if invalid > 0 {
        println!(
            "  {} {}",
            style("Invalid:").red().bold(),
            format_number(invalid as u64)
        );
    }
    println!(
        "  {} {} files, {}",
        style("Payload:").bold(),
        format_number(payload_files),
        format_size(payload_bytes, BINARY)
    );
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        duration.as_secs_f64()
    );
    println!("  {} {}", style("Report:").bold(), report_path.display());
    println!();
}
