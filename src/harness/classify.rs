//! Outcome classification.
//!
//! Maps one evaluation result and the test's declared `negative`
//! expectation onto the closed six-label taxonomy. An expectation is
//! matched only against the exact condition category it names; an
//! unexpected fault kind is CRASHED, never silently accepted.

use std::fmt;

use crate::eval::EvalCondition;

/// The closed set of classification results. Exactly one per execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Passed,
    Failed,
    Crashed,
    NotImplemented,
    Timeout,
    /// The test expected a failure but the run completed cleanly.
    NoFail,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Passed => "PASSED",
            Label::Failed => "FAILED",
            Label::Crashed => "CRASHED",
            Label::NotImplemented => "NOT_IMPLEMENTED",
            Label::Timeout => "TIMEOUT",
            Label::NoFail => "NO_FAIL",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one assembled unit. Created exactly once per
/// execution, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub label: Label,
    /// Human-readable detail; empty for PASSED.
    pub reason: String,
    /// Full captured failure detail; empty unless the label is FAILED,
    /// CRASHED, NOT_IMPLEMENTED or TIMEOUT.
    pub diagnostic: String,
}

impl ExecutionOutcome {
    pub fn passed() -> Self {
        Self {
            label: Label::Passed,
            reason: String::new(),
            diagnostic: String::new(),
        }
    }

    pub fn no_fail() -> Self {
        Self {
            label: Label::NoFail,
            reason: "???".to_string(),
            diagnostic: String::new(),
        }
    }

    /// Synthesized by the scheduler when a test exceeds its budget.
    pub fn timeout() -> Self {
        Self {
            label: Label::Timeout,
            reason: "?".to_string(),
            diagnostic: "TERMINATED".to_string(),
        }
    }

    pub fn crashed(reason: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            label: Label::Crashed,
            reason: reason.into(),
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.label == Label::Passed
    }
}

/// Classify one evaluation against the test's `negative` expectation.
///
/// Unimplemented features surface as NOT_IMPLEMENTED regardless of the
/// expectation: they signal an evaluator gap, not a test-correctness
/// signal. Synchronous; runs inside whatever context the scheduler
/// provides.
pub fn classify(result: Result<(), EvalCondition>, negative: Option<&str>) -> ExecutionOutcome {
    match result {
        Ok(()) => match negative {
            None => ExecutionOutcome::passed(),
            Some(_) => ExecutionOutcome::no_fail(),
        },
        Err(EvalCondition::NotImplemented(msg)) => ExecutionOutcome {
            label: Label::NotImplemented,
            reason: format!("not implemented - \"{msg}\""),
            diagnostic: msg,
        },
        Err(EvalCondition::Language(msg)) => match negative {
            Some(kind) if kind != "SyntaxError" => ExecutionOutcome::passed(),
            _ => ExecutionOutcome {
                label: Label::Failed,
                reason: msg.clone(),
                diagnostic: msg,
            },
        },
        Err(EvalCondition::Syntax(msg)) => match negative {
            Some("SyntaxError") => ExecutionOutcome::passed(),
            _ => ExecutionOutcome::crashed("could not parse", msg),
        },
        Err(EvalCondition::Fault(msg)) => ExecutionOutcome::crashed("unknown - urgent", msg),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> String {
        "detail".to_string()
    }

    // Every cell of the (evaluator outcome × negative expectation) table.
    #[test]
    fn classification_table_is_complete() {
        let table: [(Result<(), EvalCondition>, Option<&str>, Label); 15] = [
            (Ok(()), None, Label::Passed),
            (Ok(()), Some("SyntaxError"), Label::NoFail),
            (Ok(()), Some("TypeError"), Label::NoFail),
            (Err(EvalCondition::NotImplemented(msg())), None, Label::NotImplemented),
            (
                Err(EvalCondition::NotImplemented(msg())),
                Some("SyntaxError"),
                Label::NotImplemented,
            ),
            (
                Err(EvalCondition::NotImplemented(msg())),
                Some("TypeError"),
                Label::NotImplemented,
            ),
            (Err(EvalCondition::Language(msg())), None, Label::Failed),
            (Err(EvalCondition::Language(msg())), Some("SyntaxError"), Label::Failed),
            (Err(EvalCondition::Language(msg())), Some("TypeError"), Label::Passed),
            (Err(EvalCondition::Syntax(msg())), None, Label::Crashed),
            (Err(EvalCondition::Syntax(msg())), Some("SyntaxError"), Label::Passed),
            (Err(EvalCondition::Syntax(msg())), Some("TypeError"), Label::Crashed),
            (Err(EvalCondition::Fault(msg())), None, Label::Crashed),
            (Err(EvalCondition::Fault(msg())), Some("SyntaxError"), Label::Crashed),
            (Err(EvalCondition::Fault(msg())), Some("TypeError"), Label::Crashed),
        ];
        for (result, negative, expected) in table {
            let got = classify(result.clone(), negative);
            assert_eq!(
                got.label, expected,
                "result {result:?} with negative {negative:?} classified as {got:?}"
            );
        }
    }

    #[test]
    fn passed_has_empty_reason_and_diagnostic() {
        let outcome = classify(Err(EvalCondition::Syntax(msg())), Some("SyntaxError"));
        assert_eq!(outcome, ExecutionOutcome::passed());
        assert!(outcome.reason.is_empty());
        assert!(outcome.diagnostic.is_empty());
    }

    #[test]
    fn language_failure_carries_the_condition_message() {
        let outcome = classify(Err(EvalCondition::Language("x is undefined".into())), None);
        assert_eq!(outcome.label, Label::Failed);
        assert_eq!(outcome.reason, "x is undefined");
        assert_eq!(outcome.diagnostic, "x is undefined");
    }

    #[test]
    fn unexpected_syntax_error_reads_could_not_parse() {
        let outcome = classify(Err(EvalCondition::Syntax("eof".into())), None);
        assert_eq!(outcome.reason, "could not parse");
        assert_eq!(outcome.diagnostic, "eof");
    }

    #[test]
    fn fault_is_flagged_urgent() {
        let outcome = classify(Err(EvalCondition::Fault("segv".into())), Some("TypeError"));
        assert_eq!(outcome.label, Label::Crashed);
        assert_eq!(outcome.reason, "unknown - urgent");
    }

    #[test]
    fn no_fail_reason_is_three_question_marks() {
        let outcome = classify(Ok(()), Some("TypeError"));
        assert_eq!(outcome.reason, "???");
        assert!(outcome.diagnostic.is_empty());
    }

    #[test]
    fn labels_render_their_canonical_forms() {
        assert_eq!(Label::Passed.to_string(), "PASSED");
        assert_eq!(Label::NotImplemented.to_string(), "NOT_IMPLEMENTED");
        assert_eq!(Label::NoFail.to_string(), "NO_FAIL");
    }
}
