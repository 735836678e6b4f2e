//! End-to-end runner tests: registration through transcript.
//!
//! Time-dependent tests run on a paused tokio clock, so the 3000 ms deadline elapses instantly and
//! deterministically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taptest::assert::{equal, fail};
use taptest::failure::TIMEOUT_MESSAGE;
use taptest::{Failure, Mode, RunConfig, Runner, SuiteBuilder, TapReporter, TestResult, Value, run_suite};

async fn panics() {
    panic!("boom");
}

async fn mismatch() -> TestResult {
    Err(Failure {
        actual: Value::object([("a", 1)]),
        expected: Value::object([("a", 2)]),
        ..Failure::new("Value must be deep equal")
    })
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[tokio::test]
async fn adds_passes() {
    let mut builder = SuiteBuilder::new();
    builder.test("adds", || async { equal(1 + 1, 2) });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap();
    assert_eq!(report.lines, ["TAP version 13", "1..1", "ok 1 adds"]);
    assert!(!report.failed);
}

#[tokio::test]
async fn broken_fails_with_diagnostics() {
    let mut builder = SuiteBuilder::new();
    builder.test("broken", || async { equal(1, 2) });

    let failure = run_suite(builder.build(), &RunConfig::default()).await.unwrap_err();
    assert_eq!(failure.to_string(), "Test failed");

    let report = failure.report;
    assert!(report.failed);
    assert_eq!(report.lines.len(), 3);
    let entry = &report.lines[2];
    assert!(entry.starts_with("not ok 1 broken\n# Actual:\n# \n# 1\n# \n# Expected:\n# \n# 2\n"));
    assert!(entry.contains("# Stack:\n# \n# AssertionError: Value must be equal\n#     at "));
    assert!(entry.contains("runner_tests.rs"));
}

#[tokio::test]
async fn four_modes_fail_only_on_normal_failure() {
    let mut builder = SuiteBuilder::new();
    builder
        .test("passes", || async { equal(1, 1) })
        .test("fails", || async { equal(1, 2) })
        .todo("wip", || async { fail("not yet") })
        .skip("later", || async { fail("never runs") });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap_err().report;

    assert_eq!(report.lines[1], "1..4");
    assert_eq!(report.lines[2], "ok 1 passes");
    assert!(report.lines[3].starts_with("not ok 2 fails\n"));
    assert_eq!(report.lines[4], "ok 3 # TODO wip");
    assert_eq!(report.lines[5], "ok 4 # SKIP later");
    assert!(report.failed);
}

#[tokio::test]
async fn todo_failure_alone_keeps_suite_green() {
    let mut builder = SuiteBuilder::new();
    builder.todo("wip", || async { fail("not yet") }).test("done", || async {});

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap();
    assert_eq!(report.transcript(), "TAP version 13\n1..2\nok 1 # TODO wip\nok 2 done");
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn never_settling_body_times_out() {
    let mut builder = SuiteBuilder::new();
    builder
        .test("hangs", std::future::pending::<()>)
        .test("next", || async { equal(1, 1) });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap_err().report;

    insta::assert_snapshot!(report.transcript(), @r"
    TAP version 13
    1..2
    not ok 1 hangs
    # Actual:
    # 
    # undefined
    # 
    # Expected:
    # 
    # undefined
    # 
    # Stack:
    # 
    # TimeoutError: Test timed out.
    #     after 3000ms
    ok 2 next
    ");
}

#[tokio::test(start_paused = true)]
async fn timeout_outcome_carries_message() {
    let mut builder = SuiteBuilder::new();
    builder.test("slow", || async { tokio::time::sleep(Duration::from_millis(50)).await });

    let mut reporter = TapReporter::new();
    let config = RunConfig::new().with_timeout(Duration::from_millis(10));
    let summary = Runner::new(config).run(builder.build(), &mut reporter).await;

    assert_eq!(summary.failed, 1);
    assert!(reporter.lines()[2].starts_with("not ok 1 slow\n"));
    assert!(reporter.lines()[2].contains(TIMEOUT_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn timed_out_body_is_aborted() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);

    let mut builder = SuiteBuilder::new();
    builder.test("abandoned", move || async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap_err().report;
    assert!(report.lines[2].starts_with("not ok 1 abandoned"));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn fast_body_beats_the_timer() {
    let mut builder = SuiteBuilder::new();
    builder.test("quick", || async { tokio::time::sleep(Duration::from_millis(2999)).await });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap();
    assert_eq!(report.lines[2], "ok 1 quick");
}

// =============================================================================
// Containment and ordering
// =============================================================================

#[tokio::test]
async fn panicking_body_fails_only_its_test() {
    let mut builder = SuiteBuilder::new();
    builder.test("explodes", panics).test("survives", || async {});

    let mut reporter = TapReporter::new();
    let summary = Runner::default().run(builder.build(), &mut reporter).await;

    assert_eq!((summary.passed, summary.failed), (1, 1));
    let lines = reporter.lines();
    assert!(lines[2].starts_with("not ok 1 explodes\n"));
    assert!(lines[2].contains("# panic: boom"));
    assert_eq!(lines[3], "ok 2 survives");
}

#[tokio::test]
async fn runs_sequentially_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = SuiteBuilder::new();

    for i in 1..=3 {
        let log = Arc::clone(&log);
        builder.test(format!("t{i}"), move || async move {
            log.lock().unwrap().push(format!("start {i}"));
            tokio::task::yield_now().await;
            log.lock().unwrap().push(format!("end {i}"));
        });
    }
    let skipped = Arc::clone(&log);
    builder.skip("t4", move || async move {
        skipped.lock().unwrap().push("skip ran".to_string());
    });

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        ["start 1", "end 1", "start 2", "end 2", "start 3", "end 3"]
    );
    for (i, line) in report.lines[2..].iter().enumerate() {
        assert!(line.starts_with(&format!("ok {} ", i + 1)), "{line}");
    }
}

#[tokio::test]
async fn module_labels_follow_directives() {
    let mut builder = SuiteBuilder::new();
    builder.module("math").test("adds", || async {}).skip("divides", || async {});
    builder.todo("loose", || async {});

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap();
    assert_eq!(
        report.lines[2..],
        ["ok 1 math - adds", "ok 2 # SKIP math - divides", "ok 3 # TODO loose"]
    );
}

#[tokio::test]
async fn structured_diagnostics_are_pretty_printed() {
    let mut builder = SuiteBuilder::new();
    builder.test("objects", mismatch);

    let report = run_suite(builder.build(), &RunConfig::default()).await.unwrap_err().report;

    insta::assert_snapshot!(report.lines[2], @r#"
    not ok 1 objects
    # Actual:
    # 
    # {
    #   "a": 1
    # }
    # 
    # Expected:
    # 
    # {
    #   "a": 2
    # }
    "#);
}

#[tokio::test]
async fn foreign_errors_fail_with_undefined_values() {
    let mut builder = SuiteBuilder::new();
    builder.test("parses", || async { "x".parse::<i32>().map(|_| ()) });

    let mut reporter = TapReporter::new();
    let summary = Runner::default().run(builder.build(), &mut reporter).await;

    assert!(summary.is_failure());
    let entry = &reporter.lines()[2];
    assert!(entry.contains("# Actual:\n# \n# undefined"));
    assert!(entry.contains("# Error: invalid digit found in string"));
}

#[tokio::test]
async fn summary_counts_every_mode() {
    let mut builder = SuiteBuilder::new();
    builder
        .test("a", || async {})
        .test("b", || async { equal(1, 2) })
        .todo("c", || async {})
        .skip("d", || async {});
    let suite = builder.build();
    let modes: Vec<Mode> = suite.tests().map(|t| t.mode).collect();
    assert_eq!(modes, [Mode::Normal, Mode::Normal, Mode::Todo, Mode::Skip]);

    let mut reporter = TapReporter::new();
    let summary = Runner::default().run(suite, &mut reporter).await;
    assert_eq!(
        (summary.total, summary.passed, summary.failed, summary.todo, summary.skipped),
        (4, 1, 1, 1, 1)
    );
}
