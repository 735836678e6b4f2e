//! Command-line entry point.
//!
//! `taptest` runs the bundled self-test suite; other binaries hand their own suite to [`run_with`]. The TAP
//! transcript goes to stdout when every test passes. When a normal test fails, the transcript goes to stderr and
//! the process exits with code 1.
//!
//! ## Design
//!
//! Arguments are parsed with clap derive. [`execute`] returns a `CliResult` instead of exiting, so only
//! [`run_with`] calls `process::exit`.
//!
//! Panics the harness catches (inside `throws` or a test body) are already part of the result, so while a suite
//! runs the panic hook logs them at debug level instead of printing them to stderr.

use std::cell::Cell;
use std::fmt;
use std::panic;
use std::process;
use std::sync::Once;
use std::time::Duration;

use clap::Parser;
use tracing::debug;

use crate::runner::{RunConfig, run_suite};
use crate::selftest;
use crate::suite::Suite;

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Carries the text to print on stderr and the exit code to return to the shell.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Exit code 1.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a test suite and print a TAP transcript
#[derive(Parser, Debug)]
#[command(name = "taptest")]
#[command(version = VERSION)]
#[command(about = "Run a test suite and print a TAP transcript", long_about = None)]
pub struct Cli {
    /// Per-test timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS", default_value_t = crate::runner::DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
}

impl Cli {
    pub fn config(&self) -> RunConfig {
        RunConfig::new().with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// Run the bundled self-test suite.
pub fn run() {
    run_with(selftest::suite());
}

/// Parse arguments, run `suite` and exit.
///
/// This is the only place where `process::exit` is called.
pub fn run_with(suite: Suite) {
    let cli = Cli::parse();
    let output = Output::from_result(execute(&cli, suite));

    match output.channel {
        Channel::Stdout => println!("{}", output.text),
        Channel::Stderr if !output.text.is_empty() => eprintln!("{}", output.text),
        Channel::Stderr => {}
    }
    if output.exit_code != ExitCode::SUCCESS {
        process::exit(output.exit_code.0);
    }
}

/// Stream a run's text is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

/// What [`run_with`] prints, where, and how the process ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub channel: Channel,
    pub text: String,
    pub exit_code: ExitCode,
}

impl Output {
    /// A passing transcript goes to stdout; a failing one (or any other error) goes to stderr.
    pub fn from_result(result: CliResult<String>) -> Self {
        match result {
            Ok(text) => Self {
                channel: Channel::Stdout,
                text,
                exit_code: ExitCode::SUCCESS,
            },
            Err(e) => Self {
                channel: Channel::Stderr,
                text: e.message,
                exit_code: e.exit_code,
            },
        }
    }
}

/// Run `suite` on a current-thread runtime and return the transcript.
pub fn execute(cli: &Cli, suite: Suite) -> CliResult<String> {
    let config = cli.config();
    debug!(timeout_ms = cli.timeout_ms, tests = suite.len(), "starting run");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting runtime: {e}")))?;

    // Every body runs on this thread, so the capture covers all of them.
    let _capture = PanicCapture::start();
    match runtime.block_on(run_suite(suite, &config)) {
        Ok(report) => Ok(report.transcript()),
        Err(failure) => Err(CliError::failure(failure.report.transcript())),
    }
}

thread_local! {
    static CAPTURING_PANICS: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// While alive, panics on the current thread are logged instead of printed. Other threads keep the previous hook.
struct PanicCapture {
    was_capturing: bool,
}

impl PanicCapture {
    fn start() -> Self {
        PANIC_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if CAPTURING_PANICS.with(Cell::get) {
                    debug!(panic = %info, "caught panic");
                } else {
                    previous(info);
                }
            }));
        });
        Self {
            was_capturing: CAPTURING_PANICS.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for PanicCapture {
    fn drop(&mut self) {
        CAPTURING_PANICS.with(|flag| flag.set(self.was_capturing));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assert::{equal, throws};
    use crate::suite::SuiteBuilder;

    fn capturing_panics() -> bool {
        CAPTURING_PANICS.with(Cell::get)
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("taptest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.timeout_ms, 3000);
        assert_eq!(cli.config(), RunConfig::default());
    }

    #[test]
    fn test_cli_parse_timeout() {
        let cli = cli(&["--timeout-ms", "50"]);
        assert_eq!(cli.config().timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_cli_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["taptest", "--timeout-ms", "soon"]).is_err());
    }

    #[test]
    fn test_execute_passing_suite() {
        let mut builder = SuiteBuilder::new();
        builder.test("adds", || async { equal(1 + 1, 2) });
        let transcript = execute(&cli(&[]), builder.build()).unwrap();
        assert_eq!(transcript, "TAP version 13\n1..1\nok 1 adds");
    }

    #[test]
    fn test_execute_failing_suite() {
        let mut builder = SuiteBuilder::new();
        builder.test("broken", || async { equal(1, 2) });
        let err = execute(&cli(&[]), builder.build()).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.starts_with("TAP version 13\n1..1\nnot ok 1 broken\n# Actual:"));
    }

    #[test]
    fn test_execute_catches_panics_without_failing() {
        let mut builder = SuiteBuilder::new();
        builder.test("throws", || async {
            throws(|| -> Result<(), CliError> { panic!("contained") })
        });
        let transcript = execute(&cli(&[]), builder.build()).unwrap();
        assert_eq!(transcript, "TAP version 13\n1..1\nok 1 throws");
        assert!(!capturing_panics());
    }

    #[test]
    fn test_panic_capture_restores_previous_state() {
        assert!(!capturing_panics());
        {
            let _outer = PanicCapture::start();
            {
                let _inner = PanicCapture::start();
                assert!(capturing_panics());
            }
            assert!(capturing_panics());
            let result: std::thread::Result<()> = panic::catch_unwind(|| panic!("quiet"));
            assert!(result.is_err());
        }
        assert!(!capturing_panics());
    }

    #[test]
    fn test_output_routes_passing_transcript_to_stdout() {
        let output = Output::from_result(Ok("TAP version 13\n1..0".to_string()));
        assert_eq!(output.channel, Channel::Stdout);
        assert_eq!(output.text, "TAP version 13\n1..0");
        assert_eq!(output.exit_code, ExitCode::SUCCESS);
    }

    #[test]
    fn test_output_routes_failing_transcript_to_stderr() {
        let mut builder = SuiteBuilder::new();
        builder.test("broken", || async { equal(1, 2) });
        let output = Output::from_result(execute(&cli(&[]), builder.build()));
        assert_eq!(output.channel, Channel::Stderr);
        assert!(output.text.starts_with("TAP version 13\n1..1\nnot ok 1 broken\n"));
        assert_eq!(output.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_execute_empty_suite() {
        let transcript = execute(&cli(&[]), SuiteBuilder::new().build()).unwrap();
        assert_eq!(transcript, "TAP version 13\n1..0");
    }
}
