#![forbid(unsafe_code)]
//! A small asynchronous test harness with TAP output.
//!
//! Tests are declared on a [`SuiteBuilder`] in one of three modes (normal, todo, skip), frozen into a [`Suite`] and
//! run strictly in order by the [`Runner`]. Every body races a per-test timeout. Outcomes are rendered as a TAP
//! version 13 transcript by the [`TapReporter`].
//!
//! ```rust,no_run
//! use taptest::assert::{deep_equal, equal};
//! use taptest::{RunConfig, SuiteBuilder, TestResult, Value, run_suite};
//!
//! async fn adds() -> TestResult {
//!     equal(1 + 1, 2)?;
//!     deep_equal(Value::array([1, 2]), Value::array([1, 2]))?;
//!     Ok(())
//! }
//!
//! # async fn demo() {
//! let mut builder = SuiteBuilder::new();
//! builder.module("math").test("adds", adds);
//! let report = run_suite(builder.build(), &RunConfig::default()).await;
//! # }
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: failures travel as `Result` values. Assertions return [`AssertResult`], bodies return
//!   [`TestResult`], and only [`cli::run`] ends the process.
//! - **Test bodies**: a panic inside a body is caught by the runner and recorded as that test's failure.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod assert;
pub mod cli;
pub mod failure;
pub mod matcher;
pub mod report;
pub mod runner;
pub mod selftest;
pub mod suite;

pub use taptest_core::{Class, Value};

pub use assert::{AssertResult, AssertResultExt, AssertionFailure};
pub use failure::{Failure, TestResult};
pub use matcher::{ErrorType, Matcher};
pub use report::{Report, TapReporter, TestReporter};
pub use runner::{Outcome, RunConfig, RunSummary, Runner, SuiteFailure, run_suite};
pub use suite::{Mode, Suite, SuiteBuilder, TestInfo};
