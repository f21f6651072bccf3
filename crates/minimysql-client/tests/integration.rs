//! End-to-end tests against the mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use minimysql_auth::AuthError;
use minimysql_client::{Client, Config, Credentials, Error, QueryResult, TimeoutConfig};
use minimysql_testing::{AuthFlow, MockColumn, MockMysqlServer, MockResponse};

fn test_config(server: &MockMysqlServer) -> Config {
    Config::new(server.host(), Credentials::new("app", "secret"))
        .port(server.port())
        .connect_attempts(1)
        .timeouts(
            TimeoutConfig::new()
                .connect_timeout(Duration::from_secs(2))
                .plain_read_timeout(Duration::from_secs(2)),
        )
}

#[tokio::test]
async fn test_connect_native_auth() {
    let server = MockMysqlServer::builder().build().await.unwrap();

    let client = Client::connect(test_config(&server)).await.unwrap();
    assert_eq!(client.server_version(), "8.0.39-mock");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_fast_auth() {
    let server = MockMysqlServer::builder()
        .with_auth_plugin("caching_sha2_password")
        .with_auth_flow(AuthFlow::FastAuth)
        .build()
        .await
        .unwrap();

    let client = Client::connect(test_config(&server)).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_rejected_surfaces_server_error() {
    let server = MockMysqlServer::builder()
        .with_auth_flow(AuthFlow::Reject {
            code: 1045,
            state: "28000".into(),
            message: "Access denied for user 'app'".into(),
        })
        .build()
        .await
        .unwrap();

    let err = Client::connect(test_config(&server)).await.unwrap_err();
    match err {
        Error::Authentication(AuthError::ServerRejected { code, state, .. }) => {
            assert_eq!(code, 1045);
            assert_eq!(state.as_deref(), Some("28000"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_retries_exhausted() {
    // Bind then drop to get a port that refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = Config::new("127.0.0.1", Credentials::new("app", "secret"))
        .port(port)
        .connect_attempts(2)
        .connect_retry_delay(Duration::from_millis(10));

    let err = Client::connect(config).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ConnectRetriesExhausted { attempts: 2 }
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_update_reports_rows_affected() {
    let server = MockMysqlServer::builder()
        .with_response("UPDATE t SET x=1", MockResponse::rows_affected(512, 0))
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();
    let result = client.execute("UPDATE t SET x=1").await.unwrap();

    let summary = result.summary().copied().expect("summary expected");
    assert_eq!(summary.rows_affected, 512);
    assert_eq!(summary.last_insert_id, 0);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_result_set_streaming_with_null() {
    let server = MockMysqlServer::builder()
        .with_response(
            "SELECT id, note FROM orders",
            MockResponse::result_set(
                vec![
                    MockColumn::new("shop", "orders", "id"),
                    MockColumn::new("shop", "orders", "note"),
                ],
                vec![
                    vec![Some("1".into()), Some("first".into())],
                    vec![Some("2".into()), None],
                ],
            ),
        )
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();
    let result = client.execute("SELECT id, note FROM orders").await.unwrap();

    let mut set = result.result_set().expect("result set expected");
    assert_eq!(set.column_count(), 2);

    let columns = set.columns().await.unwrap();
    assert_eq!(columns[0].name, "id");
    assert_eq!(columns[1].name, "note");
    assert_eq!(columns[0].database, "shop");
    assert_eq!(columns[0].table, "orders");

    let row = set.next_row().await.unwrap().expect("first row");
    assert_eq!(row.get(0), Some("1"));
    assert_eq!(row.get_by_name("note"), Some("first"));

    let row = set.next_row().await.unwrap().expect("second row");
    assert_eq!(row.get(0), Some("2"));
    assert!(row.is_null(1));

    assert!(set.next_row().await.unwrap().is_none());
    // Past the end stays ended.
    assert!(set.next_row().await.unwrap().is_none());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_rows_before_columns_is_invalid_sequence() {
    let server = MockMysqlServer::builder()
        .with_default_response(MockResponse::result_set(
            vec![MockColumn::new("shop", "orders", "id")],
            vec![vec![Some("1".into())]],
        ))
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();
    let result = client.execute("SELECT id FROM orders").await.unwrap();
    let mut set = result.result_set().unwrap();

    let err = set.next_row().await.unwrap_err();
    assert!(matches!(err, Error::InvalidSequence(_)));
}

#[tokio::test]
async fn test_statement_error_surfaces() {
    let server = MockMysqlServer::builder()
        .with_default_response(MockResponse::error(1064, "42000", "syntax error near 'FRM'"))
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();
    let err = client.execute("SELECT * FRM t").await.unwrap_err();

    assert!(err.is_server_error(1064));
    match err {
        Error::Server { state, message, .. } => {
            assert_eq!(state.as_deref(), Some("42000"));
            assert!(message.contains("syntax error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The connection is still usable after a statement error.
    assert!(client.execute("SELECT * FRM t").await.is_err());
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_trailing_status_packets_are_drained() {
    let server = MockMysqlServer::builder()
        .with_response(
            "CALL refresh()",
            MockResponse::result_set(
                vec![MockColumn::new("shop", "stats", "n")],
                vec![vec![Some("3".into())]],
            )
            .with_trailing_ok(2),
        )
        .with_response("SELECT 1", MockResponse::rows_affected(0, 0))
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();

    let result = client.execute("CALL refresh()").await.unwrap();
    let mut set = result.result_set().unwrap();
    set.columns().await.unwrap();
    while set.next_row().await.unwrap().is_some() {}

    // The trailing OK packets were consumed; the next exchange is clean.
    let result = client.execute("SELECT 1").await.unwrap();
    assert!(result.summary().is_some());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_receive_buffer_grows_monotonically() {
    let long_note = "x".repeat(600);
    let server = MockMysqlServer::builder()
        .with_response("SELECT small", MockResponse::rows_affected(1, 0))
        .with_response(
            "SELECT big",
            MockResponse::result_set(
                vec![MockColumn::new("shop", "orders", "note")],
                vec![vec![Some(long_note.clone())]],
            ),
        )
        .build()
        .await
        .unwrap();

    let mut client = Client::connect(test_config(&server)).await.unwrap();

    client.execute("SELECT small").await.unwrap();
    let after_small = client.buffer_high_water();

    let result = client.execute("SELECT big").await.unwrap();
    let mut set = result.result_set().unwrap();
    set.columns().await.unwrap();
    let row = set.next_row().await.unwrap().expect("row");
    assert_eq!(row.get(0).map(str::len), Some(600));
    assert!(set.next_row().await.unwrap().is_none());

    let after_big = client.buffer_high_water();
    assert!(after_big > after_small);

    // A small exchange afterwards never shrinks the buffer.
    client.execute("SELECT small").await.unwrap();
    assert_eq!(client.buffer_high_water(), after_big);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_oversized_statement_rejected_before_write() {
    let server = MockMysqlServer::builder().build().await.unwrap();
    let mut client = Client::connect(test_config(&server)).await.unwrap();

    let statement = "x".repeat(2000);
    let err = client.execute(&statement).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Codec(minimysql_codec::CodecError::WriteTooLarge { .. })
    ));
}
