//! Sequential test execution with per-test timeouts.
//!
//! The runner drains a [`Suite`] once, in order, one test at a time. Each body runs as its own task and races a
//! timer; both report into a [`Settlement`], a single-result slot where the first writer wins and any later write is
//! a no-op. Whichever side loses is aborted.
//!
//! Errors and panics in a body are contained: they become the test's [`Failure`] and the next test still runs.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::assert::Panicked;
use crate::failure::{Failure, TestResult};
use crate::report::{Report, TapReporter, TestReporter};
use crate::suite::{Body, Mode, Suite, TestInfo};

/// How long a test body may run before it is reported as timed out.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Deadline for each test body
    pub timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-test deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The recorded result of one test.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub test: TestInfo,
    pub passed: bool,
    pub failure: Option<Failure>,
}

impl Outcome {
    fn from_result(test: TestInfo, result: TestResult) -> Self {
        match result {
            Ok(()) => Self {
                test,
                passed: true,
                failure: None,
            },
            Err(failure) => Self {
                test,
                passed: false,
                failure: Some(failure),
            },
        }
    }

    /// Only a failing Normal test fails the suite; Todo failures are absorbed.
    pub fn fails_suite(&self) -> bool {
        self.test.mode == Mode::Normal && !self.passed
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// Failing Normal tests.
    pub failed: usize,
    /// Todo tests, whatever their result.
    pub todo: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome.test.mode {
            Mode::Skip => self.skipped += 1,
            Mode::Todo => self.todo += 1,
            Mode::Normal if outcome.passed => self.passed += 1,
            Mode::Normal => self.failed += 1,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failed > 0
    }
}

/// Raised once, after every test has run, when a Normal test failed.
#[derive(Debug, Error)]
#[error("Test failed")]
pub struct SuiteFailure {
    /// The full transcript, still printed on failure.
    pub report: Report,
}

/// A single-result completion slot: the first [`settle`](Settlement::settle) delivers, later ones are ignored.
#[derive(Debug)]
pub struct Settlement<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Settlement<T> {
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let settlement = Self {
            sender: Mutex::new(Some(tx)),
        };
        (Arc::new(settlement), rx)
    }

    /// Deliver `value` if nothing was delivered yet. Returns whether this call won.
    pub fn settle(&self, value: T) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        sender.is_some_and(|tx| tx.send(value).is_ok())
    }

    pub fn is_settled(&self) -> bool {
        match self.sender.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

/// Drives a suite and feeds outcomes to a reporter.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run every test in order. Never fails: test failures are recorded in the summary.
    #[tracing::instrument(skip_all, fields(test_count = suite.len()))]
    pub async fn run(&self, suite: Suite, reporter: &mut dyn TestReporter) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary {
            total: suite.len(),
            ..RunSummary::default()
        };

        reporter.on_plan(summary.total);

        for (index, descriptor) in suite.into_tests().into_iter().enumerate() {
            let seq = index + 1;
            let (test, body) = descriptor.into_parts();
            reporter.on_test_start(seq, &test);

            let outcome = match test.mode {
                Mode::Skip => Outcome::from_result(test, Ok(())),
                Mode::Normal | Mode::Todo => {
                    let result = self.execute(body).await;
                    Outcome::from_result(test, result)
                }
            };

            debug!(
                seq,
                test = %outcome.test.name,
                mode = ?outcome.test.mode,
                passed = outcome.passed,
                "test completed"
            );
            summary.record(&outcome);
            reporter.on_test_complete(seq, &outcome);
        }

        summary.duration = start.elapsed();
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            todo = summary.todo,
            skipped = summary.skipped,
            duration_ms = summary.duration.as_millis() as u64,
            "run complete"
        );
        reporter.on_run_complete(&summary);
        summary
    }

    /// Race one body against the deadline.
    async fn execute(&self, body: Body) -> TestResult {
        let (settlement, verdict) = Settlement::channel();

        let task = tokio::spawn(async move { body().await });
        let body_handle = task.abort_handle();
        let body_slot = Arc::clone(&settlement);
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => Err(Failure::from_panic(Panicked::from_payload(err.into_panic()))),
                // Aborted: the timer already settled.
                Err(_) => return,
            };
            body_slot.settle(result);
        });

        let timeout = self.config.timeout;
        let timer_slot = Arc::clone(&settlement);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if timer_slot.settle(Err(Failure::timeout(timeout))) {
                debug!(timeout_ms = timeout.as_millis() as u64, "test timed out");
            }
        });

        let result = verdict
            .await
            .unwrap_or_else(|_| Err(Failure::new("Test was cancelled.")));

        timer.abort();
        body_handle.abort();
        result
    }
}

/// Run `suite` with the TAP reporter.
///
/// Returns the report when every Normal test passed, and [`SuiteFailure`] (still carrying the full report)
/// otherwise.
pub async fn run_suite(suite: Suite, config: &RunConfig) -> Result<Report, SuiteFailure> {
    let mut reporter = TapReporter::new();
    let summary = Runner::new(config.clone()).run(suite, &mut reporter).await;
    let report = reporter.finish(summary.is_failure());
    if report.failed {
        Err(SuiteFailure { report })
    } else {
        Ok(report)
    }
}
