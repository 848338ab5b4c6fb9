//! Command-line interface for the conformance harness.
//!
//! The CLI is a thin wrapper around `harness::run_suite`: argument parsing
//! with clap, configuration wiring, and exit-code handling. Command
//! functions return `CliResult<T>` instead of calling `process::exit`;
//! only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod report;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::eval::ProcessEvaluator;
use crate::harness::metadata::TestMetadata;
use crate::harness::{HarnessConfig, Reporter, run_suite};
use report::{ConsoleReporter, JsonReporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Conformance-test harness for external language evaluators
#[derive(Parser, Debug)]
#[command(name = "conform")]
#[command(version = VERSION)]
#[command(about = "Run a conformance corpus against an external evaluator", long_about = None)]
pub struct Cli {
    /// Corpus root directory (or a single test file)
    #[arg(value_name = "CORPUS", required_unless_present = "metadata_file")]
    pub corpus: Option<PathBuf>,

    /// Evaluator command; invoked per test with the assembled source file
    /// appended as its final argument
    #[arg(
        long = "evaluator",
        value_name = "CMD",
        required_unless_present = "metadata_file"
    )]
    pub evaluator: Option<String>,

    /// Includes directory holding init.js and the named fragments
    #[arg(long = "includes", value_name = "DIR", default_value = "includes")]
    pub includes: PathBuf,

    /// Per-test wall-clock budget in seconds
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Maximum concurrent test executions
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Run strict-mode-only tests too
    #[arg(long)]
    pub strict: bool,

    /// Emit one JSON object per result instead of the console format
    #[arg(long)]
    pub json: bool,

    /// Test-source file extension
    #[arg(long, value_name = "EXT", default_value = "js")]
    pub ext: String,

    /// Parse one file's metadata block and dump the record (debug)
    #[arg(long = "metadata", value_name = "FILE", conflicts_with = "corpus")]
    pub metadata_file: Option<PathBuf>,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{e}");
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(file) = cli.metadata_file {
        return dump_metadata(&file);
    }
    let (Some(corpus), Some(evaluator)) = (cli.corpus, cli.evaluator) else {
        return Err(CliError::failure(
            "error: a corpus path and --evaluator are required",
        ));
    };

    let mut config = HarnessConfig::new(corpus, cli.includes);
    config.extension = cli.ext;
    config.budget = Duration::from_secs(cli.timeout_secs);
    if let Some(jobs) = cli.jobs {
        config.max_parallel = jobs;
    }
    config.include_strict = cli.strict;

    let evaluator = ProcessEvaluator::from_command_line(&evaluator)
        .ok_or_else(|| CliError::failure("error: empty evaluator command"))?;

    let mut reporter: Box<dyn Reporter> = if cli.json {
        Box::new(JsonReporter)
    } else {
        Box::new(ConsoleReporter)
    };

    let summary = run_suite(&config, Arc::new(evaluator), reporter.as_mut())
        .map_err(|e| CliError::failure(format!("error: {e}")))?;

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Dump one file's parsed metadata record (debug aid).
fn dump_metadata(path: &Path) -> CliResult<ExitCode> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::failure(format!("error reading {}: {e}", path.display())))?;
    let metadata = TestMetadata::parse(&raw)
        .map_err(|e| CliError::failure(format!("error in {}: {e}", path.display())))?;
    println!("{metadata:#?}");
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_minimal() {
        let cli = Cli::try_parse_from(["conform", "corpus/", "--evaluator", "node run.js"]).unwrap();
        assert_eq!(cli.corpus, Some(PathBuf::from("corpus/")));
        assert_eq!(cli.evaluator.as_deref(), Some("node run.js"));
        assert_eq!(cli.timeout_secs, 10);
        assert_eq!(cli.ext, "js");
        assert!(!cli.strict);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from([
            "conform",
            "corpus/",
            "--evaluator",
            "eval",
            "--includes",
            "shared/",
            "--timeout-secs",
            "3",
            "-j",
            "4",
            "--strict",
            "--json",
            "--ext",
            "mjs",
        ])
        .unwrap();
        assert_eq!(cli.includes, PathBuf::from("shared/"));
        assert_eq!(cli.timeout_secs, 3);
        assert_eq!(cli.jobs, Some(4));
        assert!(cli.strict);
        assert!(cli.json);
        assert_eq!(cli.ext, "mjs");
    }

    #[test]
    fn test_cli_requires_evaluator_with_corpus() {
        assert!(Cli::try_parse_from(["conform", "corpus/"]).is_err());
    }

    #[test]
    fn test_cli_metadata_debug_flag_stands_alone() {
        let cli = Cli::try_parse_from(["conform", "--metadata", "t.js"]).unwrap();
        assert_eq!(cli.metadata_file, Some(PathBuf::from("t.js")));
        assert!(Cli::try_parse_from(["conform", "corpus/", "--metadata", "t.js"]).is_err());
    }
}
