#![cfg(feature = "sqlite")]

//! End-to-end tests: SQLite file → RowStream → encoders

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use sqlxp_core::{Connection, ConnectionConfig, DatabaseDriver, RowSource, SqlxpError, Value};
use sqlxp_drivers::sqlite::{SqliteConnection, SqliteDriver};
use sqlxp_drivers::{DriverRegistry, block_on_tokio};
use sqlxp_encode::{
    ArrayStrategy, CsvEncoder, CsvOptions, EncodeError, Encoder, EncoderOptions,
    JsonColumnEncoder, JsonRowEncoder, OutputFormat, encoder_for,
};
use tempfile::TempDir;

/// Create a database file with sample data and return its location
fn setup_test_database() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("people.db");

    let conn = rusqlite::Connection::open(&db_path).expect("Failed to create test database");
    conn.execute_batch(
        r#"
        CREATE TABLE people (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            balance REAL,
            active BOOLEAN,
            avatar BLOB
        );
        INSERT INTO people VALUES (1, 'Alice', 'alice@example.com', 12.5, 1, x'414c');
        INSERT INTO people VALUES (2, 'Bob', NULL, 0.1, 0, NULL);
        INSERT INTO people VALUES (3, 'Chloé, "C"', 'c@example.com', -3.0, NULL, NULL);
        "#,
    )
    .expect("Failed to setup schema");

    (dir, db_path)
}

fn open(path: &PathBuf) -> SqliteConnection {
    SqliteConnection::open(path.to_str().unwrap()).expect("Failed to open database")
}

fn export(conn: &SqliteConnection, sql: &str, encoder: &dyn Encoder) -> (String, Result<u64, EncodeError>) {
    let mut rows = block_on_tokio(conn.query_rows(sql))
        .unwrap()
        .expect("query should start");
    let mut out = Vec::new();
    let result = encoder.encode(&mut rows, &mut out).map(|s| s.rows);
    (String::from_utf8(out).unwrap(), result)
}

#[test]
fn test_csv_export() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    let (out, result) = export(
        &conn,
        "SELECT id, name, email, balance, active FROM people ORDER BY id",
        &CsvEncoder::default(),
    );

    assert_eq!(result.unwrap(), 3);
    assert_eq!(
        out,
        "id,name,email,balance,active\n\
         1,Alice,alice@example.com,12.5,true\n\
         2,Bob,NULL,0.1,false\n\
         3,\"Chloé, \"\"C\"\"\",c@example.com,-3,NULL\n"
    );
}

#[test]
fn test_json_shapes() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);
    let sql = "SELECT id, email FROM people WHERE id <= 2 ORDER BY id";
    let options = EncoderOptions::default();

    let cases = [
        (
            OutputFormat::parse("json", "row").unwrap(),
            r#"[{"id":1,"email":"alice@example.com"},{"id":2,"email":null}]"#,
        ),
        (
            OutputFormat::parse("json", "column").unwrap(),
            r#"{"id":[1,2],"email":["alice@example.com",null]}"#,
        ),
        (
            OutputFormat::parse("json", "array").unwrap(),
            r#"[[1,"alice@example.com"],[2,null]]"#,
        ),
    ];

    for (format, expected) in cases {
        let encoder = encoder_for(format, &options);
        let (out, result) = export(&conn, sql, encoder.as_ref());
        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, expected, "{}", format.name());
    }
}

#[test]
fn test_blob_is_decoded_as_text() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    let (out, _) = export(
        &conn,
        "SELECT avatar FROM people WHERE id = 1",
        &JsonRowEncoder::new(),
    );
    assert_eq!(out, r#"[{"avatar":"AL"}]"#);
}

#[test]
fn test_empty_result_keeps_header() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    let (out, result) = export(
        &conn,
        "SELECT id, name FROM people WHERE id > 100",
        &CsvEncoder::new(CsvOptions {
            delimiter: b';',
            crlf: true,
        }),
    );
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "id;name\r\n");

    let (out, _) = export(
        &conn,
        "SELECT id, name FROM people WHERE id > 100",
        &JsonColumnEncoder::new(),
    );
    assert_eq!(out, r#"{"id":[],"name":[]}"#);
}

#[test]
fn test_streamed_array_matches_buffered() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);
    let sql = "SELECT * FROM people ORDER BY id";

    let buffered = EncoderOptions::default();
    let streamed = EncoderOptions {
        array_strategy: ArrayStrategy::Streamed,
        ..EncoderOptions::default()
    };
    let format = OutputFormat::parse("json", "a").unwrap();

    let (a, _) = export(&conn, sql, encoder_for(format, &buffered).as_ref());
    let (b, _) = export(&conn, sql, encoder_for(format, &streamed).as_ref());
    assert_eq!(a, b);

    let parsed: Vec<Vec<serde_json::Value>> = serde_json::from_str(&a).unwrap();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0].len(), 6);
}

#[test]
fn test_large_result_flows_through_bounded_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numbers.db");
    let setup = rusqlite::Connection::open(&path).unwrap();
    setup
        .execute_batch(
            "CREATE TABLE n (v INTEGER);
             WITH RECURSIVE seq(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM seq WHERE x < 5000)
             INSERT INTO n SELECT x FROM seq;",
        )
        .unwrap();
    drop(setup);

    let conn = open(&path);
    let (out, result) = export(&conn, "SELECT v FROM n ORDER BY v", &CsvEncoder::default());
    assert_eq!(result.unwrap(), 5000);
    assert_eq!(out.lines().count(), 5001);
    assert_eq!(out.lines().last(), Some("5000"));
}

#[test]
fn test_invalid_query_fails_before_streaming() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    let result = block_on_tokio(conn.query_rows("SELECT nope FROM missing")).unwrap();
    assert!(matches!(result, Err(SqlxpError::Query(_))));
}

#[test]
fn test_connection_is_read_only() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    // Depending on the statement, SQLite rejects a write when preparing it or
    // when the cursor first steps.
    let started = block_on_tokio(
        conn.query_rows("INSERT INTO people (id, name) VALUES (9, 'Mallory') RETURNING id"),
    )
    .unwrap();
    match started {
        Err(err) => assert!(matches!(err, SqlxpError::Query(_))),
        Ok(mut rows) => {
            let mut out = Vec::new();
            let result = CsvEncoder::default().encode(&mut rows, &mut out);
            assert!(matches!(result, Err(EncodeError::Cursor(SqlxpError::Cursor(_)))));
        }
    }

    let check = rusqlite::Connection::open(&path).unwrap();
    let count: i64 = check
        .query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn test_abandoned_stream_releases_connection() {
    let (_dir, path) = setup_test_database();
    let conn = open(&path);

    let mut rows = block_on_tokio(conn.query_rows("SELECT id FROM people ORDER BY id"))
        .unwrap()
        .unwrap();
    assert!(rows.advance());
    let mut slot = vec![Value::Null];
    rows.scan(&mut slot).unwrap();
    assert_eq!(slot, vec![Value::Int64(1)]);
    drop(rows);

    // The reader gives the connection back once it sees the closed channel.
    let (out, _) = export(&conn, "SELECT COUNT(*) AS n FROM people", &CsvEncoder::default());
    assert_eq!(out, "n\n3\n");
}

#[tokio::test]
async fn test_driver_from_registry() {
    let (_dir, path) = setup_test_database();
    let dsn = path.to_str().unwrap().to_string();

    let registry = DriverRegistry::with_defaults();
    let driver = registry.detect(&dsn).expect("sqlite accepts file paths");
    assert_eq!(driver.name(), "sqlite");

    let conn = driver
        .connect(&ConnectionConfig::from_dsn("sqlite", &dsn))
        .await
        .unwrap();
    conn.ping().await.unwrap();

    let mut rows = conn.query_rows("SELECT name FROM people ORDER BY id").await.unwrap();
    // Encoders block on the channel, so they run off the async executor.
    let out = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        CsvEncoder::default().encode(&mut rows, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(out, "name\nAlice\nBob\n\"Chloé, \"\"C\"\"\"\n");
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.db");

    let result = SqliteDriver::new()
        .connect(&ConnectionConfig::from_dsn("sqlite", missing.to_str().unwrap()))
        .await;
    assert!(matches!(result, Err(SqlxpError::Connection(_))));
}

#[test]
fn test_temporal_columns_render_as_iso_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.db");
    let setup = rusqlite::Connection::open(&path).unwrap();
    setup
        .execute_batch(
            "CREATE TABLE events (day DATE, at TIMESTAMP);
             INSERT INTO events VALUES ('2024-03-09', '2024-03-09 14:05:00');",
        )
        .unwrap();
    drop(setup);

    let conn = open(&path);
    let (json, _) = export(&conn, "SELECT day, at FROM events", &JsonRowEncoder::new());
    assert_eq!(json, r#"[{"day":"2024-03-09","at":"2024-03-09T14:05:00Z"}]"#);

    let (csv, _) = export(&conn, "SELECT day, at FROM events", &CsvEncoder::default());
    assert_eq!(csv, "day,at\n2024-03-09,2024-03-09T14:05:00Z\n");
}
