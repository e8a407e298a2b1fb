//! SQLite connection implementation

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use sqlxp_core::{
    Connection, DEFAULT_ROW_BUFFER, Result, RowEvent, RowSender, RowStream, SqlxpError, Value,
    row_channel,
};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Read-only SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
}

impl SqliteConnection {
    /// Open a SQLite database without write access.
    ///
    /// The file must already exist; `:memory:` opens an empty in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlxpError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") && !std::path::Path::new(&expanded_path).exists()
            {
                return Err(SqlxpError::Connection(format!(
                    "SQLite database does not exist: {}",
                    expanded_path
                )));
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                SqlxpError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| {
                SqlxpError::Configuration("Unable to determine HOME directory".into())
            })?;
            home.join(rest).to_string_lossy().to_string()
        } else if path.starts_with('~') {
            return Err(SqlxpError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()
                .map_err(SqlxpError::Io)?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| SqlxpError::Connection(format!("Ping failed: {}", e)))
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query_rows(&self, sql: &str) -> Result<RowStream> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let (sender, receiver) = row_channel(DEFAULT_ROW_BUFFER);
        let (columns_tx, columns_rx) = oneshot::channel();

        // rusqlite cursors borrow their statement, so the whole read runs on
        // one blocking thread that owns the connection lock.
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            stream_rows(&conn, &sql, columns_tx, sender);
        });

        let columns = columns_rx.await.map_err(|_| {
            SqlxpError::Query("SQLite reader stopped before reporting columns".into())
        })??;

        tracing::debug!(columns = columns.len(), "SQLite query started");
        Ok(RowStream::new(columns, receiver))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite connection");
        Ok(())
    }
}

/// Prepare `sql`, report its columns, then push every row into `sender`.
fn stream_rows(
    conn: &RusqliteConnection,
    sql: &str,
    columns_tx: oneshot::Sender<Result<Vec<String>>>,
    sender: RowSender,
) {
    let mut stmt = match conn.prepare(sql) {
        Ok(stmt) => stmt,
        Err(e) => {
            let _ = columns_tx.send(Err(SqlxpError::Query(format!(
                "Failed to prepare query: {}",
                e
            ))));
            return;
        }
    };

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let kinds: Vec<ColumnKind> = stmt
        .columns()
        .iter()
        .map(|col| ColumnKind::from_decl_type(col.decl_type()))
        .collect();

    let mut rows = match stmt.query([]) {
        Ok(rows) => rows,
        Err(e) => {
            let _ = columns_tx.send(Err(SqlxpError::Query(format!(
                "Failed to execute query: {}",
                e
            ))));
            return;
        }
    };

    if columns_tx.send(Ok(columns)).is_err() {
        return;
    }

    let mut sent: u64 = 0;
    loop {
        match rows.next() {
            Ok(Some(row)) => {
                let event = match read_row(row, &kinds) {
                    Ok(values) => RowEvent::Row(values),
                    Err(e) => RowEvent::ScanFailed(e),
                };
                if !sender.blocking_send(event) {
                    tracing::debug!(rows = sent, "row consumer closed, stopping SQLite cursor");
                    return;
                }
                sent += 1;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, rows = sent, "SQLite cursor failed");
                sender.blocking_send(RowEvent::CursorFailed(SqlxpError::Cursor(format!(
                    "Failed to fetch row: {}",
                    e
                ))));
                return;
            }
        }
    }

    tracing::debug!(rows = sent, "SQLite cursor exhausted");
}

/// How a column's declared type changes the reading of its cells.
///
/// SQLite stores booleans as integers and timestamps as text or integers; the
/// declared type is the only hint that a cell means something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Plain,
    Boolean,
    Date,
    Timestamp,
}

impl ColumnKind {
    fn from_decl_type(decl_type: Option<&str>) -> Self {
        match decl_type.map(str::to_ascii_lowercase).as_deref() {
            Some("boolean" | "bool") => ColumnKind::Boolean,
            Some("date") => ColumnKind::Date,
            Some("datetime" | "timestamp") => ColumnKind::Timestamp,
            _ => ColumnKind::Plain,
        }
    }
}

/// Text layouts accepted for DATE, DATETIME and TIMESTAMP columns
const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a stored timestamp; values without an offset are taken as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = text.strip_suffix('Z').unwrap_or(text);

    ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Integer timestamps are Unix seconds, or milliseconds when too large to be
/// seconds.
fn timestamp_from_integer(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() > 1_000_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

fn text_value(text: &[u8], kind: ColumnKind) -> Value {
    let text = String::from_utf8_lossy(text).into_owned();
    let temporal = match kind {
        ColumnKind::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .map(Value::Date)
            .or_else(|| parse_timestamp(&text).map(Value::DateTimeUtc)),
        ColumnKind::Timestamp => parse_timestamp(&text).map(Value::DateTimeUtc),
        ColumnKind::Plain | ColumnKind::Boolean => None,
    };
    // Unparseable text is passed through unchanged.
    temporal.unwrap_or(Value::String(text))
}

fn read_row(row: &rusqlite::Row<'_>, kinds: &[ColumnKind]) -> Result<Vec<Value>> {
    kinds
        .iter()
        .enumerate()
        .map(|(idx, &kind)| rusqlite_to_value(row, idx, kind))
        .collect()
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row<'_>, idx: usize, kind: ColumnKind) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| SqlxpError::Scan(format!("column {}: {}", idx, e)))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match kind {
            ColumnKind::Boolean => Value::Bool(i != 0),
            ColumnKind::Date | ColumnKind::Timestamp => timestamp_from_integer(i)
                .map(Value::DateTimeUtc)
                .unwrap_or(Value::Int64(i)),
            ColumnKind::Plain => Value::Int64(i),
        },
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => text_value(s, kind),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kinds_from_decl_types() {
        assert_eq!(ColumnKind::from_decl_type(Some("BOOLEAN")), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_decl_type(Some("bool")), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_decl_type(Some("Date")), ColumnKind::Date);
        assert_eq!(ColumnKind::from_decl_type(Some("DATETIME")), ColumnKind::Timestamp);
        assert_eq!(ColumnKind::from_decl_type(Some("timestamp")), ColumnKind::Timestamp);
        assert_eq!(ColumnKind::from_decl_type(Some("INTEGER")), ColumnKind::Plain);
        assert_eq!(ColumnKind::from_decl_type(None), ColumnKind::Plain);
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
            .and_utc();
        for text in [
            "2024-03-09 14:05:00",
            "2024-03-09T14:05:00",
            "2024-03-09T14:05:00Z",
            "2024-03-09 14:05",
            "2024-03-09 16:05:00+02:00",
            "2024-03-09T14:05:00.000",
        ] {
            assert_eq!(parse_timestamp(text), Some(expected), "{text}");
        }

        let with_fraction = parse_timestamp("2024-03-09 14:05:00.25").unwrap();
        assert_eq!(with_fraction.timestamp_subsec_millis(), 250);

        assert_eq!(
            parse_timestamp("2024-03-09").map(|dt| dt.to_rfc3339()),
            Some("2024-03-09T00:00:00+00:00".to_string())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_integer_timestamps() {
        assert_eq!(
            timestamp_from_integer(1_700_000_000).map(|dt| dt.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(
            timestamp_from_integer(1_700_000_000_123).map(|dt| dt.timestamp_millis()),
            Some(1_700_000_000_123)
        );
    }

    #[test]
    fn test_expand_path_keeps_special_paths() {
        assert_eq!(SqliteConnection::expand_path(":memory:").unwrap(), ":memory:");
        assert_eq!(
            SqliteConnection::expand_path("file:app.db?mode=ro").unwrap(),
            "file:app.db?mode=ro"
        );
        assert!(matches!(
            SqliteConnection::expand_path("~bob/app.db"),
            Err(SqlxpError::Configuration(_))
        ));
    }

    #[test]
    fn test_expand_path_makes_relative_absolute() {
        let expanded = SqliteConnection::expand_path("data/app.db").unwrap();
        assert!(std::path::Path::new(&expanded).is_absolute());
        assert!(expanded.ends_with("app.db"));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");
        let result = SqliteConnection::open(missing.to_str().unwrap());
        assert!(matches!(result, Err(SqlxpError::Connection(_))));
    }

    #[test]
    fn test_rows_are_converted_by_storage_class() {
        let conn = RusqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (n INTEGER, f REAL, s TEXT, b BLOB, flag BOOLEAN);
             INSERT INTO t VALUES (7, 1.5, 'text', x'00ff', 1);
             INSERT INTO t VALUES (NULL, NULL, NULL, NULL, 0);",
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT n, f, s, b, flag FROM t").unwrap();
        let kinds: Vec<ColumnKind> = stmt
            .columns()
            .iter()
            .map(|c| ColumnKind::from_decl_type(c.decl_type()))
            .collect();
        let mut rows = stmt.query([]).unwrap();

        let first = read_row(rows.next().unwrap().unwrap(), &kinds).unwrap();
        assert_eq!(
            first,
            vec![
                Value::Int64(7),
                Value::Float64(1.5),
                Value::String("text".into()),
                Value::Bytes(vec![0x00, 0xff]),
                Value::Bool(true),
            ]
        );

        let second = read_row(rows.next().unwrap().unwrap(), &kinds).unwrap();
        assert_eq!(
            second,
            vec![Value::Null, Value::Null, Value::Null, Value::Null, Value::Bool(false)]
        );
    }

    #[test]
    fn test_temporal_columns() {
        let conn = RusqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (d DATE, ts TIMESTAMP, dt DATETIME, note TEXT);
             INSERT INTO t VALUES ('2024-03-09', '2024-03-09 14:05:00', 1700000000, '2024-03-09');
             INSERT INTO t VALUES ('someday', 'soon', NULL, NULL);",
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT d, ts, dt, note FROM t").unwrap();
        let kinds: Vec<ColumnKind> = stmt
            .columns()
            .iter()
            .map(|c| ColumnKind::from_decl_type(c.decl_type()))
            .collect();
        let mut rows = stmt.query([]).unwrap();

        let first = read_row(rows.next().unwrap().unwrap(), &kinds).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            first,
            vec![
                Value::Date(date),
                Value::DateTimeUtc(date.and_hms_opt(14, 5, 0).unwrap().and_utc()),
                Value::DateTimeUtc(DateTime::from_timestamp(1_700_000_000, 0).unwrap()),
                Value::String("2024-03-09".into()),
            ]
        );

        let second = read_row(rows.next().unwrap().unwrap(), &kinds).unwrap();
        assert_eq!(
            second,
            vec![
                Value::String("someday".into()),
                Value::String("soon".into()),
                Value::Null,
                Value::Null,
            ]
        );
    }
}
