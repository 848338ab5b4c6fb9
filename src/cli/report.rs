//! Report stream implementations.
//!
//! Implement [`Reporter`] to customize the output format; the harness
//! ships a console form and a JSON-lines form.

use serde_json::json;

use crate::harness::classify::Label;
use crate::harness::{Reporter, Summary, TestRecord};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

fn paint(label: Label) -> String {
    let color = match label {
        Label::Passed => GREEN,
        Label::Failed | Label::Crashed => RED,
        Label::NotImplemented | Label::Timeout | Label::NoFail => YELLOW,
    };
    format!("{color}{label}{RESET}")
}

fn locator(record: &TestRecord) -> String {
    format!("File \"{}\", line 1", record.path.display())
}

/// Default console reporter: one line per result, a file locator line for
/// crashes, and a closing summary banner.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn on_collection_complete(&mut self, total: usize) {
        if total == 0 {
            eprintln!("no test files discovered");
        } else {
            println!("collected {total} file(s)");
        }
    }

    fn on_test_complete(&mut self, record: &TestRecord, total: usize) {
        println!(
            "[{}/{}] {} {} {} {}",
            record.seq,
            total,
            record.name,
            record.id.as_deref().unwrap_or("-"),
            paint(record.outcome.label),
            record.outcome.reason
        );
        // Crashes get a locator; timeouts deliberately do not.
        if record.outcome.label == Label::Crashed {
            println!("{}", locator(record));
        }
    }

    fn on_run_complete(&mut self, summary: &Summary) {
        let mut parts = Vec::new();
        for (count, what, color) in [
            (summary.passed, "passed", GREEN),
            (summary.failed, "failed", RED),
            (summary.crashed, "crashed", RED),
            (summary.not_implemented, "not implemented", YELLOW),
            (summary.timed_out, "timed out", YELLOW),
            (summary.no_fail, "did not fail as expected", YELLOW),
            (summary.skipped, "skipped", YELLOW),
        ] {
            if count > 0 {
                parts.push(format!("{color}{count} {what}{RESET}"));
            }
        }
        if parts.is_empty() {
            parts.push("nothing to run".to_string());
        }
        println!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

/// Machine-readable reporter: one JSON object per line.
#[derive(Debug, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn on_test_complete(&mut self, record: &TestRecord, total: usize) {
        let value = json!({
            "seq": record.seq,
            "total": total,
            "name": record.name,
            "id": record.id.as_deref(),
            "label": record.outcome.label.as_str(),
            "reason": record.outcome.reason,
            "diagnostic": record.outcome.diagnostic,
            "locator": (record.outcome.label == Label::Crashed).then(|| locator(record)),
        });
        println!("{value}");
    }

    fn on_run_complete(&mut self, summary: &Summary) {
        let value = json!({
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed,
            "crashed": summary.crashed,
            "not_implemented": summary.not_implemented,
            "timed_out": summary.timed_out,
            "no_fail": summary.no_fail,
            "skipped": summary.skipped,
            "duration_secs": summary.duration.as_secs_f64(),
        });
        println!("{value}");
    }
}

// ============================================================================
// Tests
// ============================================================================
