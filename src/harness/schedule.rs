//! Isolation and scheduling.
//!
//! Each dispatched test runs as its own tokio task: acquire a semaphore
//! permit (bounding worker concurrency suite-wide), hand the blocking
//! evaluator call to `spawn_blocking`, and race it against the wall-clock
//! budget. On expiry the test's [`CancelToken`] is flipped and a TIMEOUT
//! outcome is synthesized; a cancellation-aware evaluator stops promptly,
//! while a token-ignoring one is left detached on its blocking thread and
//! its eventual result is discarded.
//!
//! No fault escapes a task: panics inside the evaluator call are caught and
//! reported as CRASHED, as are worker join failures.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::eval::{CancelToken, Evaluator};
use crate::harness::classify::{ExecutionOutcome, classify};

pub struct Scheduler<E: Evaluator> {
    evaluator: Arc<E>,
    budget: Duration,
    permits: Arc<Semaphore>,
}

impl<E: Evaluator> Scheduler<E> {
    /// `max_parallel` must be at least 1; the config layer rejects 0
    /// before a scheduler is ever built.
    pub fn new(evaluator: Arc<E>, budget: Duration, max_parallel: usize) -> Self {
        Self {
            evaluator,
            budget,
            permits: Arc::new(Semaphore::new(max_parallel)),
        }
    }

    /// Dispatch one assembled unit. The returned handle resolves to exactly
    /// one outcome; it never propagates a panic or an error.
    pub fn dispatch(
        &self,
        seq: usize,
        source: String,
        negative: Option<String>,
    ) -> JoinHandle<ExecutionOutcome> {
        let evaluator = Arc::clone(&self.evaluator);
        let permits = Arc::clone(&self.permits);
        let budget = self.budget;
        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return ExecutionOutcome::crashed("scheduler shut down", ""),
            };
            let cancel = CancelToken::new();
            let worker_token = cancel.clone();
            tracing::debug!(seq, "dispatching");
            let work = tokio::task::spawn_blocking(move || {
                let caught = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    evaluator.evaluate(&source, &worker_token)
                }));
                match caught {
                    Ok(result) => classify(result, negative.as_deref()),
                    Err(panic) => ExecutionOutcome::crashed("harness defect", panic_text(&*panic)),
                }
            });
            match tokio::time::timeout(budget, work).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join)) => ExecutionOutcome::crashed("worker failed", join.to_string()),
                Err(_) => {
                    cancel.cancel();
                    tracing::warn!(seq, "budget exceeded, cancelling");
                    ExecutionOutcome::timeout()
                }
            }
        })
    }
}

fn panic_text(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
