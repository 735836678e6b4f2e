//! The failure record attached to a failing test.
//!
//! A [`Failure`] is never re-raised: the runner stores it in the test's outcome and the reporter renders it as
//! diagnostics. Any thread-safe error converts into one, so test bodies can use `?` on assertions and on ordinary
//! fallible calls alike.

use std::error::Error;
use std::time::Duration;

use taptest_core::Value;

use crate::assert::{AssertionFailure, BoxError, Panicked};

/// Message of the failure synthesized when a test body outlives its deadline.
pub const TIMEOUT_MESSAGE: &str = "Test timed out.";

/// Outcome of running one test body.
pub type TestResult = Result<(), Failure>;

#[derive(Debug, Clone)]
pub struct Failure {
    pub actual: Value,
    pub expected: Value,
    pub message: String,
    pub stack: Option<String>,
}

impl Failure {
    /// A failure with only a message; actual and expected are undefined.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            actual: Value::Undefined,
            expected: Value::Undefined,
            message: message.into(),
            stack: None,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self {
            stack: Some(format!("TimeoutError: {TIMEOUT_MESSAGE}\n    after {}ms", after.as_millis())),
            ..Self::new(TIMEOUT_MESSAGE)
        }
    }

    pub fn from_assertion(failure: AssertionFailure) -> Self {
        let stack = format!("AssertionError: {}\n    at {}", failure.message, failure.location);
        Self {
            actual: failure.actual,
            expected: failure.expected,
            message: failure.message,
            stack: Some(stack),
        }
    }

    pub fn from_panic(panic: Panicked) -> Self {
        Self {
            stack: Some(format!("panic: {}", panic.message)),
            ..Self::new(panic.message)
        }
    }

    /// Convert an arbitrary error, recording its source chain in the stack.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut stack = format!("Error: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {cause}"));
            source = cause.source();
        }
        Self {
            stack: Some(stack),
            ..Self::new(error.to_string())
        }
    }

    /// Convert a boxed error, keeping assertion details when the box holds an [`AssertionFailure`].
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<AssertionFailure>() {
            Ok(assertion) => Self::from_assertion(*assertion),
            Err(other) => Self::from_error(other.as_ref()),
        }
    }
}

impl<E> From<E> for Failure
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_boxed(Box::new(error))
    }
}

/// Anything a test body may finish with.
pub trait IntoTestResult {
    fn into_test_result(self) -> TestResult;
}

impl IntoTestResult for () {
    fn into_test_result(self) -> TestResult {
        Ok(())
    }
}

impl IntoTestResult for TestResult {
    fn into_test_result(self) -> TestResult {
        self
    }
}

impl<E> IntoTestResult for Result<(), E>
where
    E: Error + Send + Sync + 'static,
{
    fn into_test_result(self) -> TestResult {
        self.map_err(Failure::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assert::equal;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn assertion_keeps_values() {
        let failure = Failure::from(equal(1, 2).unwrap_err());
        assert!(matches!(failure.actual, Value::Number(n) if n == 1.0));
        assert!(matches!(failure.expected, Value::Number(n) if n == 2.0));
        assert_eq!(failure.message, "Value must be equal");
        let stack = failure.stack.unwrap();
        assert!(stack.starts_with("AssertionError: Value must be equal\n    at "));
        assert!(stack.contains(file!()));
    }

    #[test]
    fn other_errors_keep_source_chain() {
        let failure = Failure::from(Outer(Inner));
        assert!(matches!(failure.actual, Value::Undefined));
        assert_eq!(failure.message, "outer");
        assert_eq!(failure.stack.as_deref(), Some("Error: outer\n    caused by: inner"));
    }

    #[test]
    fn timeout_uses_fixed_message() {
        let failure = Failure::timeout(Duration::from_millis(3000));
        assert_eq!(failure.message, TIMEOUT_MESSAGE);
        assert_eq!(failure.stack.as_deref(), Some("TimeoutError: Test timed out.\n    after 3000ms"));
    }

    #[test]
    fn body_results_convert() {
        assert!(().into_test_result().is_ok());
        assert!(equal(1, 1).into_test_result().is_ok());
        let failure = equal("a", "b").into_test_result().unwrap_err();
        assert_eq!(failure.message, "Value must be equal");
    }
}
