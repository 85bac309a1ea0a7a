//! Tests for result retrieval and lazy paging.

use futures::StreamExt;

use redshift_data::{ErrorKind, Field};

use crate::helpers::{client_with, fast_poll, page, MockDataApi};

#[test]
fn test_single_page_result_collects() {
    let api = MockDataApi::new();
    api.result_pages(vec![page(0..3, 3)]);
    let client = client_with(api.clone(), fast_poll());

    let rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(rows.columns()[0].name, "n");
    assert_eq!(rows.total_num_rows(), 3);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(rows.collect()).unwrap();
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.get_value(2, "n"), Some(&Field::Long(2)));
    assert_eq!(api.result_calls.lock().unwrap().len(), 1);
    client.close().unwrap();
}

#[tokio::test]
async fn test_pages_are_fetched_lazily() {
    let api = MockDataApi::new();
    api.result_pages(vec![page(0..2, 5), page(2..4, 5), page(4..5, 5)]);
    let client = client_with(api.clone(), fast_poll());

    let mut rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(rows.pages_fetched(), 1);

    // Draining the first page needs no further calls.
    rows.next_record().await.unwrap().unwrap();
    rows.next_record().await.unwrap().unwrap();
    assert_eq!(api.result_calls.lock().unwrap().len(), 1);

    let third = rows.next_record().await.unwrap().unwrap();
    assert_eq!(third, vec![Field::Long(2)]);
    assert_eq!(rows.pages_fetched(), 2);
    assert_eq!(
        *api.result_calls.lock().unwrap(),
        vec![None, Some("page-1".to_string())]
    );

    let rest = rows.collect().await.unwrap();
    assert_eq!(rest.records, vec![vec![Field::Long(3)], vec![Field::Long(4)]]);
    assert_eq!(rest.total_num_rows, 5);
    client.close().unwrap();
}

#[tokio::test]
async fn test_stream_yields_every_record_across_pages() {
    let api = MockDataApi::new();
    api.result_pages(vec![page(0..4, 10), page(4..8, 10), page(8..10, 10)]);
    let client = client_with(api.clone(), fast_poll());

    let rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .await
        .unwrap();
    let values: Vec<i64> = rows
        .into_stream()
        .map(|record| record.unwrap()[0].as_i64().unwrap())
        .collect()
        .await;

    assert_eq!(values, (0..10).collect::<Vec<_>>());
    assert_eq!(api.result_calls.lock().unwrap().len(), 3);
    client.close().unwrap();
}

#[tokio::test]
async fn test_page_failure_ends_stream_after_error() {
    let api = MockDataApi::new();
    api.result_pages(vec![page(0..2, 4), page(2..4, 4)]);
    api.fail_on_token("page-1");
    let client = client_with(api.clone(), fast_poll());

    let mut rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .await
        .unwrap();

    assert!(rows.next_record().await.unwrap().is_ok());
    assert!(rows.next_record().await.unwrap().is_ok());
    let err = rows.next_record().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(rows.next_record().await.is_none());
    client.close().unwrap();
}

#[tokio::test]
async fn test_empty_result() {
    let api = MockDataApi::new();
    let client = client_with(api.clone(), fast_poll());

    let rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .await
        .unwrap();
    let result = rows.collect().await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.to_string(), "(no result set)");
    client.close().unwrap();
}

#[tokio::test]
async fn test_paging_after_close_fails_with_closed() {
    let api = MockDataApi::new();
    api.result_pages(vec![page(0..1, 2), page(1..2, 2)]);
    let client = client_with(api.clone(), fast_poll());

    let mut rows = client
        .get_statement_result("stmt-1".into())
        .unwrap()
        .await
        .unwrap();
    client.close().unwrap();

    assert!(rows.next_record().await.unwrap().is_ok());
    let err = rows.next_record().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);
}
