#![forbid(unsafe_code)]
//! Conformance-test harness
//!
//! `conform` discovers a corpus of self-describing test files, parses the
//! metadata block embedded in each, assembles prelude + includes + body
//! into one executable unit per test, runs each unit against an external
//! evaluator under a hard wall-clock budget, and classifies the outcome
//! into a closed six-label taxonomy (PASSED / FAILED / CRASHED /
//! NOT_IMPLEMENTED / TIMEOUT / NO_FAIL). A hang or native fault in one
//! test never corrupts or blocks the rest of the run.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`.
//!   The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Evaluator panics**: a panic raised inside an `Evaluator`
//!   implementation is caught at the per-test boundary and reported as a
//!   CRASHED result; it is never a harness panic.

pub mod cli;
pub mod eval;
pub mod harness;

pub use eval::{CancelToken, EvalCondition, EvalResult, Evaluator, ProcessEvaluator};
pub use harness::assemble::{AssembledUnit, FragmentStore, assemble};
pub use harness::classify::{ExecutionOutcome, Label, classify};
pub use harness::error::HarnessError;
pub use harness::metadata::TestMetadata;
pub use harness::{HarnessConfig, Reporter, Summary, TestRecord, discover, run_suite};
