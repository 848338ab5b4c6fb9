//! Per-test error taxonomy.

use thiserror::Error;

/// Errors that abort a single test, never the run.
///
/// The driver converts each of these into a CRASHED record for the affected
/// test; no variant may escape a test's boundary. The one exception is
/// `Config`, which is rejected before any test is dispatched.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("malformed metadata block: {0}")]
    Metadata(String),

    #[error("include fragment not found: {0}")]
    MissingInclude(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
