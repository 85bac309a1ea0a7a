//! Tests for waiting on statements: poll cadence, terminal states, timeouts.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use redshift_data::{ErrorKind, PollConfig, RedshiftDataError, StatementStatus};

use crate::helpers::{client_with, MockDataApi};

#[test]
fn test_wait_polls_at_fixed_interval() {
    let api = MockDataApi::new();
    api.script(
        "stmt-1",
        &[
            StatementStatus::Submitted,
            StatementStatus::Started,
            StatementStatus::Finished,
        ],
    );
    let interval = Duration::from_millis(50);
    let client = client_with(api.clone(), PollConfig::new(Duration::from_secs(5), interval));

    let started = Instant::now();
    let description = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap();

    assert_eq!(description.status, StatementStatus::Finished);
    assert_eq!(api.describe_count(), 3);
    assert!(started.elapsed() >= interval * 2);

    let times = api.describe_times.lock().unwrap().clone();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= interval);
    }
    client.close().unwrap();
}

#[test]
fn test_wait_times_out_after_deadline() {
    let api = MockDataApi::new();
    api.script("stmt-1", &[StatementStatus::Started]);
    let timeout = Duration::from_millis(150);
    let client = client_with(
        api.clone(),
        PollConfig::new(timeout, Duration::from_millis(20)),
    );

    let started = Instant::now();
    let err = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap_err();

    assert!(started.elapsed() >= timeout);
    assert_eq!(err.kind(), ErrorKind::Timeout);
    match err {
        RedshiftDataError::Timeout {
            statement_id,
            elapsed_ms,
        } => {
            assert_eq!(statement_id, "stmt-1");
            assert!(elapsed_ms >= 150);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(api.cancels.load(Ordering::SeqCst), 0);
    client.close().unwrap();
}

#[test]
fn test_timeout_cancels_statement_when_configured() {
    let api = MockDataApi::new();
    api.script("stmt-1", &[StatementStatus::Picked]);
    let mut poll = PollConfig::new(Duration::from_millis(60), Duration::from_millis(10));
    poll.cancel_on_timeout = true;
    let client = client_with(api.clone(), poll);

    let err = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(api.cancels.load(Ordering::SeqCst), 1);
    client.close().unwrap();
}

#[test]
fn test_slow_describe_still_honours_deadline_check() {
    // A describe call that outlasts the remaining budget is not retried.
    let api = MockDataApi::new();
    api.script("stmt-1", &[StatementStatus::Started]);
    api.slow_describe(Duration::from_millis(120));
    let client = client_with(
        api.clone(),
        PollConfig::new(Duration::from_millis(200), Duration::from_millis(10)),
    );

    let err = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(api.describe_count(), 2);
    client.close().unwrap();
}

#[test]
fn test_failed_statement_reports_provider_message() {
    let api = MockDataApi::new();
    api.script("stmt-1", &[StatementStatus::Started, StatementStatus::Failed]);
    api.fail_with("stmt-1", "relation \"missing\" does not exist");
    let client = client_with(
        api.clone(),
        PollConfig::new(Duration::from_secs(5), Duration::from_millis(10)),
    );

    let err = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.to_string().contains("relation \"missing\" does not exist"));
    assert_eq!(api.describe_count(), 2);
    client.close().unwrap();
}

#[test]
fn test_aborted_statement() {
    let api = MockDataApi::new();
    api.script("stmt-1", &[StatementStatus::Aborted]);
    let client = client_with(
        api.clone(),
        PollConfig::new(Duration::from_secs(5), Duration::from_millis(10)),
    );

    let err = client
        .wait_for_statement("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert_eq!(api.describe_count(), 1);
    client.close().unwrap();
}
