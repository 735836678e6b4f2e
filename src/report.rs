//! TAP reporting.
//!
//! ## TestReporter Trait
//!
//! The runner reports through the [`TestReporter`] trait, which keeps formatting out of execution. [`TapReporter`]
//! is the built-in implementation and produces a TAP version 13 transcript:
//!
//! ```text
//! TAP version 13
//! 1..3
//! ok 1 adds
//! not ok 2 broken
//! # Actual:
//! # ...
//! ok 3 # SKIP later
//! ```
//!
//! Diagnostics for a failing test are stored in the same entry as its result line, so a report always holds
//! `2 + N` entries for `N` tests.

use taptest_core::render_pretty;

use crate::failure::Failure;
use crate::runner::{Outcome, RunSummary};
use crate::suite::{Mode, TestInfo};

/// First line of every transcript.
pub const TAP_VERSION: &str = "TAP version 13";

/// Trait for reporting test execution results.
pub trait TestReporter {
    /// Called once, before any test runs, with the number of tests in the suite.
    fn on_plan(&mut self, total: usize);

    /// Called before a test body is invoked (or skipped).
    fn on_test_start(&mut self, _seq: usize, _test: &TestInfo) {}

    /// Called when a test's outcome is known.
    fn on_test_complete(&mut self, seq: usize, outcome: &Outcome);

    /// Called after the last test.
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// The finished transcript plus the overall verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<String>,
    /// Whether any Normal test failed.
    pub failed: bool,
}

impl Report {
    pub fn transcript(&self) -> String {
        self.lines.join("\n")
    }
}

/// Accumulates TAP lines as outcomes arrive.
#[derive(Debug, Default)]
pub struct TapReporter {
    lines: Vec<String>,
}

impl TapReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn finish(self, failed: bool) -> Report {
        Report {
            lines: self.lines,
            failed,
        }
    }
}

impl TestReporter for TapReporter {
    fn on_plan(&mut self, total: usize) {
        self.lines.push(TAP_VERSION.to_string());
        self.lines.push(format!("1..{total}"));
    }

    fn on_test_complete(&mut self, seq: usize, outcome: &Outcome) {
        self.lines.push(result_line(seq, outcome));
    }
}

/// The label after the sequence number: directive, module prefix, then name.
pub fn label(test: &TestInfo) -> String {
    let directive = match test.mode {
        Mode::Normal => "",
        Mode::Todo => "# TODO ",
        Mode::Skip => "# SKIP ",
    };
    match &test.module {
        Some(module) => format!("{directive}{module} - {}", test.name),
        None => format!("{directive}{}", test.name),
    }
}

/// `ok <seq> <label>`, or `not ok <seq> <label>` followed by diagnostics for a failing Normal test.
pub fn result_line(seq: usize, outcome: &Outcome) -> String {
    let line = format!("{seq} {}", label(&outcome.test));
    if !outcome.fails_suite() {
        return format!("ok {line}");
    }
    match &outcome.failure {
        Some(failure) => format!("not ok {line}\n{}", diagnostics(failure)),
        None => format!("not ok {line}"),
    }
}

/// Render a failure as a comment block: every line starts with `# `.
pub fn diagnostics(failure: &Failure) -> String {
    let mut block = vec![
        format!("Actual:\n\n{}", render_pretty(&failure.actual)),
        format!("Expected:\n\n{}", render_pretty(&failure.expected)),
    ];

    if let Some(stack) = failure.stack.as_deref().filter(|s| !s.is_empty()) {
        block.push(format!("Stack:\n\n{stack}"));
    }

    block
        .join("\n\n")
        .split('\n')
        .map(|line| format!("# {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
