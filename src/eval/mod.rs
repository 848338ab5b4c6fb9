//! The evaluator boundary.
//!
//! The system under test is reached through a single operation: "evaluate
//! this source text". An evaluation either completes normally or raises one
//! of four condition kinds, modeled as a closed enum so the classifier can
//! match on it exhaustively instead of relying on catch-ordering.
//!
//! Implementations receive a [`CancelToken`] alongside the source. The
//! scheduler flips the token when a test exceeds its budget; a
//! cancellation-aware evaluator should stop promptly. [`ProcessEvaluator`]
//! honors the token by killing its child process, which also gives
//! process-level isolation against native faults in the evaluator.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

/// Cooperative cancellation flag shared between the scheduler and one
/// in-flight evaluation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The four condition kinds an evaluator may raise.
///
/// Closed set: adding a variant is a breaking change to the classification
/// table in `harness::classify`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalCondition {
    /// The evaluator hit a feature it does not support yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// The evaluated program raised an exception in the evaluated language.
    #[error("uncaught exception: {0}")]
    Language(String),
    /// The evaluator could not parse the source text.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// Anything else: evaluator bug, signal death, spawn failure.
    #[error("{0}")]
    Fault(String),
}

/// Normal completion, or one raised condition.
pub type EvalResult = Result<(), EvalCondition>;

/// The external collaborator under test.
///
/// `evaluate` may block for an arbitrary time; the harness never calls it
/// outside an isolated worker context.
pub trait Evaluator: Send + Sync + 'static {
    fn evaluate(&self, source: &str, cancel: &CancelToken) -> EvalResult;
}

// ============================================================================
// Subprocess-backed evaluator
// ============================================================================

/// Runs a configured command once per evaluation, with the assembled source
/// written to a scratch file appended as the final argument.
///
/// Outcome protocol: exit status 0 means normal completion. On a nonzero
/// exit, the last non-empty stderr line selects the condition kind by its
/// prefix (`not-implemented:`, `uncaught:` or `syntax-error:`), with the
/// rest of that line as the condition message. Anything else, including
/// death by signal, is a fault.
pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
}

impl ProcessEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program + arguments.
    /// No shell quoting; wrap the evaluator in a script if it needs any.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl Evaluator for ProcessEvaluator {
    fn evaluate(&self, source: &str, cancel: &CancelToken) -> EvalResult {
        let mut scratch = tempfile::Builder::new()
            .prefix("conform-")
            .suffix(".src")
            .tempfile()
            .map_err(|e| EvalCondition::Fault(format!("scratch file: {e}")))?;
        scratch
            .write_all(source.as_bytes())
            .map_err(|e| EvalCondition::Fault(format!("scratch file: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EvalCondition::Fault(format!("failed to spawn evaluator: {e}")))?;

        // Drain stderr on a side thread so a chatty child cannot fill the
        // pipe and deadlock against our wait loop.
        let mut pipe = child.stderr.take();
        let drain = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(ref mut p) = pipe {
                let _ = p.read_to_string(&mut buf);
            }
            buf
        });

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EvalCondition::Fault("cancelled".to_string()));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(Duration::from_millis(1)),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EvalCondition::Fault(format!("wait failed: {e}")));
                }
            }
        };

        let stderr = drain.join().unwrap_or_default();
        if status.success() {
            return Ok(());
        }

        let tag_line = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        if let Some(msg) = tag_line.strip_prefix("not-implemented:") {
            return Err(EvalCondition::NotImplemented(msg.trim().to_string()));
        }
        if let Some(msg) = tag_line.strip_prefix("uncaught:") {
            return Err(EvalCondition::Language(msg.trim().to_string()));
        }
        if let Some(msg) = tag_line.strip_prefix("syntax-error:") {
            return Err(EvalCondition::Syntax(msg.trim().to_string()));
        }
        Err(EvalCondition::Fault(match status.code() {
            Some(code) => format!("evaluator exited with status {code}: {}", stderr.trim()),
            None => format!("evaluator killed by signal: {}", stderr.trim()),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
