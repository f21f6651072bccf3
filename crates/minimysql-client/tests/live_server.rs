//! Tests against a live MySQL/MariaDB server.
//!
//! All tests are `#[ignore]`d; they require a reachable server.
//!
//! Run with:
//!   MYSQL_HOST=127.0.0.1 \
//!   MYSQL_USER=root \
//!   MYSQL_PASSWORD=... \
//!   cargo test --test live_server -- --ignored --nocapture

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use minimysql_client::{Client, Config, Credentials, QueryResult, TlsConfig, TlsMode};

fn live_config() -> Option<Config> {
    let host = std::env::var("MYSQL_HOST").ok()?;
    let user = std::env::var("MYSQL_USER").ok()?;
    let password = std::env::var("MYSQL_PASSWORD").unwrap_or_default();

    let port = std::env::var("MYSQL_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3306);

    let mut credentials = Credentials::new(user, password);
    if let Ok(db) = std::env::var("MYSQL_DATABASE") {
        credentials = credentials.with_database(db);
    }

    Some(Config::new(host, credentials).port(port))
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn test_live_connect_and_select() {
    let config = live_config().expect("MYSQL_HOST and MYSQL_USER must be set");
    let mut client = Client::connect(config).await.unwrap();

    println!("server version: {}", client.server_version());

    match client.execute("SELECT 1").await.unwrap() {
        QueryResult::ResultSet(mut set) => {
            set.columns().await.unwrap();
            let row = set.next_row().await.unwrap().expect("one row");
            assert_eq!(row.get(0), Some("1"));
            assert!(set.next_row().await.unwrap().is_none());
        }
        QueryResult::Summary(_) => panic!("SELECT should return rows"),
    }

    client.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn test_live_connect_with_tls() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = live_config()
        .expect("MYSQL_HOST and MYSQL_USER must be set")
        .tls(TlsMode::Required(
            TlsConfig::new().trust_server_certificate(true),
        ));

    let mut client = Client::connect(config).await.unwrap();

    match client.execute("SHOW STATUS LIKE 'Ssl_cipher'").await.unwrap() {
        QueryResult::ResultSet(mut set) => {
            set.columns().await.unwrap();
            let row = set.next_row().await.unwrap().expect("one row");
            let cipher = row.get(1).unwrap_or_default();
            assert!(!cipher.is_empty(), "connection should be encrypted");
            while set.next_row().await.unwrap().is_some() {}
        }
        QueryResult::Summary(_) => panic!("SHOW STATUS should return rows"),
    }

    client.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn test_live_update_summary() {
    let config = live_config().expect("MYSQL_HOST and MYSQL_USER must be set");
    let mut client = Client::connect(config).await.unwrap();

    client
        .execute("CREATE TEMPORARY TABLE minimysql_t (x INT)")
        .await
        .unwrap();
    client
        .execute("INSERT INTO minimysql_t VALUES (1), (2), (3)")
        .await
        .unwrap();

    let result = client.execute("UPDATE minimysql_t SET x = 0").await.unwrap();
    let summary = result.summary().copied().expect("summary expected");
    assert_eq!(summary.rows_affected, 3);

    client.close().await.unwrap();
}
