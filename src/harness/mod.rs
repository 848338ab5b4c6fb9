//! Core harness: configuration, discovery, and the suite driver.
//!
//! The driver walks the corpus in sorted order, parses and assembles each
//! test synchronously, tags it with its discovery index, and hands
//! non-skipped units to the scheduler. Results stream back to the reporter
//! in discovery order regardless of completion order. Per-test failures of
//! the harness itself (malformed metadata, missing include, unreadable
//! file) become CRASHED records for that test only; the run always
//! completes and reports every dispatched test.

pub mod assemble;
pub mod classify;
pub mod error;
pub mod metadata;
pub mod schedule;

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::eval::Evaluator;
use assemble::FragmentStore;
use classify::{ExecutionOutcome, Label};
use error::HarnessError;
use metadata::TestMetadata;
use schedule::Scheduler;

/// Suite-wide per-test wall-clock budget.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(10);

/// Upper bound on the default worker count.
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Suite-wide configuration, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub corpus_root: PathBuf,
    pub includes_dir: PathBuf,
    /// Test-source file extension (without the dot).
    pub extension: String,
    pub budget: Duration,
    pub max_parallel: usize,
    /// Run strict-mode-only tests too.
    pub include_strict: bool,
}

impl HarnessConfig {
    pub fn new(corpus_root: impl Into<PathBuf>, includes_dir: impl Into<PathBuf>) -> Self {
        let parallel = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(DEFAULT_MAX_PARALLEL);
        Self {
            corpus_root: corpus_root.into(),
            includes_dir: includes_dir.into(),
            extension: "js".to_string(),
            budget: DEFAULT_BUDGET,
            max_parallel: parallel,
            include_strict: false,
        }
    }

    /// Rejecting a zero worker count up front is the only process-fatal
    /// condition in the harness.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.max_parallel == 0 {
            return Err(HarnessError::Config(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(HarnessError::Config("empty test-source extension".to_string()));
        }
        Ok(())
    }
}

/// One reported result: sequence index, identity, and outcome.
#[derive(Debug, Clone)]
pub struct TestRecord {
    /// Position in sorted discovery order, assigned before dispatch.
    pub seq: usize,
    /// Corpus-relative path with the extension dropped.
    pub name: String,
    /// Declared test identifier, when the metadata carries one.
    pub id: Option<String>,
    pub path: PathBuf,
    pub outcome: ExecutionOutcome,
}

/// Per-label tallies for one run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Discovered candidate files, including skipped ones.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
    pub not_implemented: usize,
    pub timed_out: usize,
    pub no_fail: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl Summary {
    fn tally(&mut self, label: Label) {
        match label {
            Label::Passed => self.passed += 1,
            Label::Failed => self.failed += 1,
            Label::Crashed => self.crashed += 1,
            Label::NotImplemented => self.not_implemented += 1,
            Label::Timeout => self.timed_out += 1,
            Label::NoFail => self.no_fail += 1,
        }
    }

    /// Count of tests that produced a record (everything but skips).
    pub fn reported(&self) -> usize {
        self.passed + self.failed + self.crashed + self.not_implemented + self.timed_out + self.no_fail
    }

    pub fn all_passed(&self) -> bool {
        self.reported() == self.passed
    }
}

/// Receives the result stream. Implementations must not assume anything
/// about completion timing: records arrive in discovery order.
pub trait Reporter {
    fn on_collection_complete(&mut self, _total: usize) {}

    fn on_test_complete(&mut self, record: &TestRecord, total: usize);

    fn on_run_complete(&mut self, _summary: &Summary) {}
}

/// Recursively collect candidate test files under `root`, sorted for a
/// deterministic discovery order.
pub fn discover(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect(root, extension, &mut files);
    files.sort();
    files
}

fn collect(path: &Path, extension: &str, out: &mut Vec<PathBuf>) {
    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            out.push(path.to_path_buf());
        }
        return;
    }
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if entry_path.is_dir() {
            let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with('.') {
                collect(&entry_path, extension, out);
            }
        } else if entry_path.extension().and_then(|e| e.to_str()) == Some(extension) {
            out.push(entry_path);
        }
    }
}

fn test_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.with_extension("").display().to_string()
}

/// Run the whole suite: discover, assemble, execute, classify, report.
///
/// Returns the summary; individual records reach the caller through the
/// reporter. Only configuration problems (bad worker count, unreadable
/// includes directory, missing prelude) abort the run.
pub fn run_suite<E: Evaluator>(
    config: &HarnessConfig,
    evaluator: Arc<E>,
    reporter: &mut dyn Reporter,
) -> Result<Summary, HarnessError> {
    config.validate()?;
    let store = Arc::new(FragmentStore::load(&config.includes_dir)?);
    let files = discover(&config.corpus_root, &config.extension);
    tracing::info!(total = files.len(), corpus = %config.corpus_root.display(), "discovered corpus");
    reporter.on_collection_complete(files.len());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::Io)?;
    runtime.block_on(drive(config, evaluator, store, files, reporter))
}

/// A test between dispatch and reporting.
enum Slot {
    /// Resolved without dispatch (per-test harness failure).
    Done(ExecutionOutcome),
    Running(JoinHandle<ExecutionOutcome>),
    Skipped,
}

struct Pending {
    seq: usize,
    name: String,
    id: Option<String>,
    path: PathBuf,
    slot: Slot,
}

async fn drive<E: Evaluator>(
    config: &HarnessConfig,
    evaluator: Arc<E>,
    store: Arc<FragmentStore>,
    files: Vec<PathBuf>,
    reporter: &mut dyn Reporter,
) -> Result<Summary, HarnessError> {
    let scheduler = Scheduler::new(evaluator, config.budget, config.max_parallel);
    let total = files.len();
    let mut summary = Summary {
        total,
        ..Summary::default()
    };
    let start = Instant::now();

    // Keep a bounded window of units in flight so huge corpora do not pin
    // every assembled source in memory at once; order is preserved by
    // draining the window front-first.
    let window = config.max_parallel.saturating_mul(2).max(2);
    let mut in_flight: VecDeque<Pending> = VecDeque::with_capacity(window);

    for (seq, path) in files.into_iter().enumerate() {
        let name = test_name(&config.corpus_root, &path);
        let pending = match prepare(&path, &store, config) {
            Ok((meta, unit)) => {
                if unit.skip {
                    Pending {
                        seq,
                        name,
                        id: meta.id,
                        path,
                        slot: Slot::Skipped,
                    }
                } else {
                    let handle = scheduler.dispatch(seq, unit.source, meta.negative.clone());
                    Pending {
                        seq,
                        name,
                        id: meta.id,
                        path,
                        slot: Slot::Running(handle),
                    }
                }
            }
            Err(err) => Pending {
                seq,
                name,
                id: None,
                path,
                slot: Slot::Done(ExecutionOutcome::crashed(err.to_string(), err.to_string())),
            },
        };
        in_flight.push_back(pending);
        while in_flight.len() >= window {
            if let Some(front) = in_flight.pop_front() {
                finish(front, total, &mut summary, reporter).await;
            }
        }
    }
    while let Some(front) = in_flight.pop_front() {
        finish(front, total, &mut summary, reporter).await;
    }

    summary.duration = start.elapsed();
    reporter.on_run_complete(&summary);
    Ok(summary)
}

/// Read, parse and assemble one test. Synchronous and non-blocking;
/// failures here are per-test fatal.
fn prepare(
    path: &Path,
    store: &FragmentStore,
    config: &HarnessConfig,
) -> Result<(TestMetadata, assemble::AssembledUnit), HarnessError> {
    let raw = fs::read_to_string(path)?;
    let meta = TestMetadata::parse(&raw)?;
    let unit = assemble::assemble(&meta, &raw, store, config.include_strict)?;
    Ok((meta, unit))
}

async fn finish(pending: Pending, total: usize, summary: &mut Summary, reporter: &mut dyn Reporter) {
    let outcome = match pending.slot {
        Slot::Skipped => {
            summary.skipped += 1;
            return;
        }
        Slot::Done(outcome) => outcome,
        Slot::Running(handle) => match handle.await {
            Ok(outcome) => outcome,
            // The scheduler task itself died; still one record per test.
            Err(join) => ExecutionOutcome::crashed("scheduler task failed", join.to_string()),
        },
    };
    let record = TestRecord {
        seq: pending.seq,
        name: pending.name,
        id: pending.id,
        path: pending.path,
        outcome,
    };
    summary.tally(record.outcome.label);
    reporter.on_test_complete(&record, total);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_rejected_up_front() {
        let mut config = HarnessConfig::new("corpus", "includes");
        config.max_parallel = 0;
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn default_config_is_valid() {
        let config = HarnessConfig::new("corpus", "includes");
        assert!(config.validate().is_ok());
        assert!(config.max_parallel >= 1);
        assert_eq!(config.budget, DEFAULT_BUDGET);
        assert!(!config.include_strict);
    }

    #[test]
    fn test_name_is_corpus_relative_without_extension() {
        let root = Path::new("/corpus");
        let path = Path::new("/corpus/built-ins/Object/create/15.2.3.5-4-9.js");
        assert_eq!(test_name(root, path), "built-ins/Object/create/15.2.3.5-4-9");
    }

    #[test]
    fn summary_all_passed_accounts_for_every_label() {
        let mut summary = Summary::default();
        summary.tally(Label::Passed);
        assert!(summary.all_passed());
        summary.tally(Label::NoFail);
        assert!(!summary.all_passed());
        assert_eq!(summary.reported(), 2);
    }
}
