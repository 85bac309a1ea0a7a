//! Tests for batch submission: ordering, inlined parameters, limits.

use redshift_data::{
    ErrorKind, ParameterizedQuery, StatementOptions, StatementStatus, MAX_BATCH_STATEMENTS,
};

use crate::helpers::{client_with, fast_poll, MockDataApi};

fn queries(n: usize) -> Vec<ParameterizedQuery> {
    (0..n)
        .map(|i| ParameterizedQuery::new(format!("INSERT INTO t VALUES ({i})")))
        .collect()
}

#[test]
fn test_batch_returns_sub_statements_in_submission_order() {
    let api = MockDataApi::new();
    api.script(
        "batch-1",
        &[StatementStatus::Submitted, StatementStatus::Finished],
    );
    // Provider lists sub-statements out of order.
    api.sub_statement_ids(&["batch-1:3", "batch-1:1", "batch-1:2"]);
    let client = client_with(api.clone(), fast_poll());

    let handles = client
        .batch_execute_statement(queries(3), None)
        .unwrap()
        .wait()
        .unwrap();

    let ids: Vec<&str> = handles.iter().map(|h| h.as_str()).collect();
    assert_eq!(ids, vec!["batch-1:1", "batch-1:2", "batch-1:3"]);
    assert_eq!(api.describe_count(), 2);
    client.close().unwrap();
}

#[test]
fn test_batch_sub_statement_count_matches_input() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let handles = client
        .batch_execute_statement(queries(5), None)
        .unwrap()
        .wait()
        .unwrap();

    assert_eq!(handles.len(), 5);
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(handle.sub_index(), Some(i as u32 + 1));
    }
    client.close().unwrap();
}

#[test]
fn test_batch_inlines_parameters() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let batch = vec![
        ParameterizedQuery::new("UPDATE users SET name = :name WHERE id = :id")
            .bind("name", "O'Brien")
            .bind("id", 7),
        ParameterizedQuery::new("SELECT created_at::date FROM users WHERE active = :active")
            .bind("active", true),
    ];
    client
        .batch_execute_statement_with(batch, None, StatementOptions::named("fixups"))
        .unwrap()
        .wait()
        .unwrap();

    let batches = api.batches.lock().unwrap();
    assert_eq!(
        batches[0].sqls,
        vec![
            "UPDATE users SET name = 'O''Brien' WHERE id = 7".to_string(),
            "SELECT created_at::date FROM users WHERE active = TRUE".to_string(),
        ]
    );
    assert_eq!(batches[0].statement_name.as_deref(), Some("fixups"));
    drop(batches);
    client.close().unwrap();
}

#[test]
fn test_batch_inlining_ignores_comments_and_quoted_identifiers() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let batch = vec![ParameterizedQuery::new(
        "SELECT \"col:id\" FROM users -- filter was :id\nWHERE id = :id",
    )
    .bind("id", "\n; DROP TABLE users; --")];
    client
        .batch_execute_statement(batch, None)
        .unwrap()
        .wait()
        .unwrap();

    let batches = api.batches.lock().unwrap();
    assert_eq!(
        batches[0].sqls,
        vec![
            "SELECT \"col:id\" FROM users -- filter was :id\nWHERE id = '\n; DROP TABLE users; --'"
                .to_string()
        ]
    );
    drop(batches);
    client.close().unwrap();
}

#[test]
fn test_batch_limits_are_validated_before_submission() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let empty = client.batch_execute_statement(vec![], None).err().unwrap();
    assert_eq!(empty.kind(), ErrorKind::Validation);

    let too_many = client
        .batch_execute_statement(queries(MAX_BATCH_STATEMENTS + 1), None)
        .err()
        .unwrap();
    assert_eq!(too_many.kind(), ErrorKind::Validation);

    let mut bad = queries(2);
    bad.push(ParameterizedQuery::new("   "));
    let err = client.batch_execute_statement(bad, None).err().unwrap();
    assert!(err.to_string().contains("statement 3"));

    assert!(api.batches.lock().unwrap().is_empty());
    client.close().unwrap();
}

#[test]
fn test_batch_at_limit_is_accepted() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let handles = client
        .batch_execute_statement(queries(MAX_BATCH_STATEMENTS), None)
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(handles.len(), MAX_BATCH_STATEMENTS);
    client.close().unwrap();
}

#[test]
fn test_failed_batch_surfaces_execution_error() {
    let api = MockDataApi::new();
    api.script("batch-1", &[StatementStatus::Started, StatementStatus::Failed]);
    api.fail_with("batch-1", "sub-statement 2 failed");
    let client = client_with(api.clone(), fast_poll());

    let err = client
        .batch_execute_statement(queries(2), None)
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.to_string().contains("sub-statement 2 failed"));
    client.close().unwrap();
}

#[test]
fn test_batch_with_mismatched_sub_statements_is_provider_error() {
    let api = MockDataApi::new();
    api.sub_statement_ids(&["batch-1:1"]);
    let client = client_with(api.clone(), fast_poll());

    let err = client
        .batch_execute_statement(queries(2), None)
        .unwrap()
        .wait()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    client.close().unwrap();
}
