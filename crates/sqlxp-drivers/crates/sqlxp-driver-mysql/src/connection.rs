//! MySQL connection implementation

use async_trait::async_trait;
use mysql_async::{
    Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row as MySqlRow,
    consts::ColumnType, prelude::*,
};
use sqlxp_core::{
    Connection, DEFAULT_ROW_BUFFER, Result, RowEvent, RowSender, RowStream, SqlxpError, Value,
    row_channel,
};
use std::sync::OnceLock;
use tokio::sync::oneshot;

/// Global Tokio runtime for MySQL operations.
///
/// mysql_async internally calls `tokio::spawn` for connection pooling and
/// networking, so every pool operation is dispatched onto this runtime.
fn get_mysql_runtime() -> Result<&'static tokio::runtime::Runtime> {
    static RUNTIME: OnceLock<std::io::Result<tokio::runtime::Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .thread_name("sqlxp-mysql-runtime")
                .build()
        })
        .as_ref()
        .map_err(|e| SqlxpError::Connection(format!("Failed to create MySQL runtime: {}", e)))
}

/// MySQL connection wrapper
pub struct MySqlConnection {
    pool: Pool,
}

impl MySqlConnection {
    /// Connect to a MySQL database using a single-connection pool
    pub async fn connect(opts_builder: OptsBuilder) -> Result<Self> {
        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            SqlxpError::Connection("Failed to configure MySQL pool constraints (min=1, max=1)".into())
        })?;

        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        let opts: Opts = opts_builder.pool_opts(pool_opts).into();

        tracing::info!(
            host = %opts.ip_or_hostname(),
            port = %opts.tcp_port(),
            database = ?opts.db_name(),
            "connecting to MySQL database"
        );

        // Pool creation and initial connection test must run on the Tokio runtime
        // because mysql_async internally uses tokio::spawn for pool management.
        let pool = get_mysql_runtime()?
            .spawn(async move {
                let pool = Pool::new(opts);
                let _conn = pool.get_conn().await.map_err(|e| {
                    SqlxpError::Connection(format!("Failed to connect to MySQL: {}", e))
                })?;
                Ok::<Pool, SqlxpError>(pool)
            })
            .await
            .map_err(|e| SqlxpError::Connection(format!("MySQL connection task failed: {}", e)))??;

        tracing::info!("MySQL connection established");
        Ok(Self { pool })
    }

    /// Get a connection from the pool, dispatched on the MySQL Tokio runtime
    async fn get_conn(&self) -> Result<Conn> {
        let pool = self.pool.clone();
        get_mysql_runtime()?
            .spawn(async move { pool.get_conn().await })
            .await
            .map_err(|e| SqlxpError::Connection(format!("MySQL get_conn task failed: {}", e)))?
            .map_err(|e| SqlxpError::Connection(format!("Failed to get MySQL connection: {}", e)))
    }
}

/// Convert mysql_async Value to our Value type.
///
/// The text protocol delivers every cell as bytes; numeric column types are
/// parsed, everything else stays raw bytes.
pub(crate) fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match col_type {
            ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_YEAR => parse_integer(bytes),
            ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                match std::str::from_utf8(&bytes).ok().and_then(|s| s.parse::<f64>().ok()) {
                    Some(f) => Value::Float64(f),
                    None => Value::Bytes(bytes),
                }
            }
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                match String::from_utf8(bytes) {
                    Ok(s) => Value::Decimal(s),
                    Err(e) => Value::Bytes(e.into_bytes()),
                }
            }
            _ => Value::Bytes(bytes),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => match i64::try_from(u) {
            Ok(i) => Value::Int64(i),
            Err(_) => Value::UInt64(u),
        },
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                match date {
                    Some(date) => Value::Date(date),
                    None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
                }
            } else {
                match date
                    .and_then(|d| d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro))
                {
                    Some(dt) => Value::DateTime(dt),
                    None => Value::String(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, min, sec
                    )),
                }
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

fn parse_integer(bytes: Vec<u8>) -> Value {
    let Ok(text) = std::str::from_utf8(&bytes) else {
        return Value::Bytes(bytes);
    };
    if let Ok(i) = text.parse::<i64>() {
        Value::Int64(i)
    } else if let Ok(u) = text.parse::<u64>() {
        Value::UInt64(u)
    } else {
        Value::Bytes(bytes)
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        get_mysql_runtime()?
            .spawn(async move { conn.ping().await })
            .await
            .map_err(|e| SqlxpError::Connection(format!("MySQL ping task failed: {}", e)))?
            .map_err(|e| SqlxpError::Connection(format!("Ping failed: {}", e)))
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query_rows(&self, sql: &str) -> Result<RowStream> {
        let conn = self.get_conn().await?;
        let sql = sql.to_string();
        let (sender, receiver) = row_channel(DEFAULT_ROW_BUFFER);
        let (columns_tx, columns_rx) = oneshot::channel();

        get_mysql_runtime()?.spawn(async move {
            stream_rows(conn, &sql, columns_tx, sender).await;
        });

        let columns = columns_rx.await.map_err(|_| {
            SqlxpError::Query("MySQL reader stopped before reporting columns".into())
        })??;

        tracing::debug!(columns = columns.len(), "MySQL query started");
        Ok(RowStream::new(columns, receiver))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing MySQL connection pool");
        let pool = self.pool.clone();
        get_mysql_runtime()?
            .spawn(async move { pool.disconnect().await })
            .await
            .map_err(|e| SqlxpError::Connection(format!("MySQL close task failed: {}", e)))?
            .map_err(|e| {
                SqlxpError::Connection(format!("Failed to close MySQL connection: {}", e))
            })?;
        Ok(())
    }
}

/// Run `sql` over the text protocol, report its columns, then forward rows.
async fn stream_rows(
    mut conn: Conn,
    sql: &str,
    columns_tx: oneshot::Sender<Result<Vec<String>>>,
    sender: RowSender,
) {
    let mut result = match conn.query_iter(sql).await {
        Ok(result) => result,
        Err(e) => {
            let _ = columns_tx.send(Err(SqlxpError::Query(format!(
                "Failed to execute query: {}",
                e
            ))));
            return;
        }
    };

    let Some(columns) = result.columns() else {
        let _ = columns_tx.send(Err(SqlxpError::Metadata(
            "statement did not produce a result set".into(),
        )));
        return;
    };
    let names: Vec<String> = columns.iter().map(|col| col.name_str().to_string()).collect();
    let types: Vec<ColumnType> = columns.iter().map(|col| col.column_type()).collect();

    if columns_tx.send(Ok(names)).is_err() {
        return;
    }

    let mut sent: u64 = 0;
    loop {
        let event = match result.next().await {
            Ok(Some(row)) => match read_row(row, &types) {
                Ok(values) => RowEvent::Row(values),
                Err(e) => RowEvent::ScanFailed(e),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, rows = sent, "MySQL cursor failed");
                sender
                    .send(RowEvent::CursorFailed(SqlxpError::Cursor(format!(
                        "Failed to fetch row: {}",
                        e
                    ))))
                    .await;
                return;
            }
        };

        if !sender.send(event).await {
            tracing::debug!(rows = sent, "row consumer closed, stopping MySQL cursor");
            return;
        }
        sent += 1;
    }

    tracing::debug!(rows = sent, "MySQL cursor exhausted");
}

fn read_row(mut row: MySqlRow, types: &[ColumnType]) -> Result<Vec<Value>> {
    types
        .iter()
        .enumerate()
        .map(|(idx, &col_type)| {
            row.take::<mysql_async::Value, usize>(idx)
                .map(|val| mysql_value_to_value(val, col_type))
                .ok_or_else(|| SqlxpError::Scan(format!("column {} missing from row", idx)))
        })
        .collect()
}
