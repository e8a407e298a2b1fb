//! PostgreSQL connection implementation

use async_trait::async_trait;
use futures::StreamExt;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use sqlxp_core::{
    Connection, DEFAULT_ROW_BUFFER, Result, RowEvent, RowSender, RowStream, SqlxpError, Value,
    row_channel,
};
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::oneshot;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row as PgRow};

use crate::value::postgres_to_value;

/// Global Tokio runtime for PostgreSQL operations.
///
/// tokio-postgres needs a Tokio reactor for networking. The connection task
/// and every row producer run here, independent of the caller's executor.
fn get_postgres_runtime() -> Result<&'static tokio::runtime::Runtime> {
    static RUNTIME: OnceLock<std::io::Result<tokio::runtime::Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .thread_name("sqlxp-postgres-runtime")
                .build()
        })
        .as_ref()
        .map_err(|e| SqlxpError::Connection(format!("Failed to create PostgreSQL runtime: {}", e)))
}

pub(crate) fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let code = db_error.code();
    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail()
        && !detail.trim().is_empty()
    {
        message.push_str(&format!(" (detail: {})", detail));
    }

    if let Some(hint) = db_error.hint()
        && !hint.trim().is_empty()
    {
        message.push_str(&format!(" (hint: {})", hint));
    }

    if let Some(position) = db_error.position() {
        message.push_str(&format!(" (position: {:?})", position));
    }

    match code.code() {
        "42P01" => format!("undefined table: {}", message),
        "42703" => format!("undefined column: {}", message),
        "42601" => format!("syntax error: {}", message),
        "25006" => format!("read-only transaction: {}", message),
        _ => format!("{} (code: {})", message, code.code()),
    }
}

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Arc<Client>,
}

impl PostgresConnection {
    /// Connect to a PostgreSQL database.
    ///
    /// TLS is negotiated through native-tls unless the configuration's
    /// `sslmode` is `disable`. Certificates are not verified, matching
    /// libpq's `prefer` and `require` modes.
    pub async fn connect(config: tokio_postgres::Config) -> Result<Self> {
        let ssl_mode = config.get_ssl_mode();
        tracing::info!(
            hosts = ?config.get_hosts(),
            database = ?config.get_dbname(),
            ssl_mode = ?ssl_mode,
            "connecting to PostgreSQL database"
        );

        let runtime = get_postgres_runtime()?;

        let client = if ssl_mode == SslMode::Disable {
            let (client, connection) = runtime
                .spawn(async move { config.connect(NoTls).await })
                .await
                .map_err(|e| {
                    SqlxpError::Connection(format!("PostgreSQL connection task failed: {}", e))
                })?
                .map_err(|e| {
                    SqlxpError::Connection(format!(
                        "Failed to connect to PostgreSQL: {}",
                        format_postgres_error(&e)
                    ))
                })?;

            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "PostgreSQL connection task ended");
                }
            });

            client
        } else {
            let tls_connector = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| {
                    SqlxpError::Connection(format!("Failed to build TLS connector: {}", e))
                })?;
            let tls = MakeTlsConnector::new(tls_connector);

            let (client, connection) = runtime
                .spawn(async move { config.connect(tls).await })
                .await
                .map_err(|e| {
                    SqlxpError::Connection(format!("PostgreSQL connection task failed: {}", e))
                })?
                .map_err(|e| {
                    SqlxpError::Connection(format!(
                        "Failed to connect to PostgreSQL: {}",
                        format_postgres_error(&e)
                    ))
                })?;

            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "PostgreSQL connection task ended");
                }
            });

            client
        };

        tracing::info!("PostgreSQL connection established");
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| SqlxpError::Connection(format!("Ping failed: {}", format_postgres_error(&e))))
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query_rows(&self, sql: &str) -> Result<RowStream> {
        let client = Arc::clone(&self.client);
        let sql = sql.to_string();
        let (sender, receiver) = row_channel(DEFAULT_ROW_BUFFER);
        let (columns_tx, columns_rx) = oneshot::channel();

        get_postgres_runtime()?.spawn(async move {
            stream_rows(&client, &sql, columns_tx, sender).await;
        });

        let columns = columns_rx.await.map_err(|_| {
            SqlxpError::Query("PostgreSQL reader stopped before reporting columns".into())
        })??;

        tracing::debug!(columns = columns.len(), "PostgreSQL query started");
        Ok(RowStream::new(columns, receiver))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing PostgreSQL connection");
        Ok(())
    }
}

/// Prepare `sql`, report its columns, then forward the portal's rows.
async fn stream_rows(
    client: &Client,
    sql: &str,
    columns_tx: oneshot::Sender<Result<Vec<String>>>,
    sender: RowSender,
) {
    let statement = match client.prepare(sql).await {
        Ok(statement) => statement,
        Err(e) => {
            let _ = columns_tx.send(Err(SqlxpError::Query(format!(
                "Failed to prepare query: {}",
                format_postgres_error(&e)
            ))));
            return;
        }
    };

    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let rows = match client
        .query_raw(&statement, std::iter::empty::<&(dyn ToSql + Sync)>())
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            let _ = columns_tx.send(Err(SqlxpError::Query(format!(
                "Failed to execute query: {}",
                format_postgres_error(&e)
            ))));
            return;
        }
    };

    if columns_tx.send(Ok(columns)).is_err() {
        return;
    }

    let mut rows = std::pin::pin!(rows);
    let mut sent: u64 = 0;
    while let Some(next) = rows.next().await {
        let event = match next {
            Ok(row) => match read_row(&row) {
                Ok(values) => RowEvent::Row(values),
                Err(e) => RowEvent::ScanFailed(e),
            },
            Err(e) => {
                tracing::debug!(error = %e, rows = sent, "PostgreSQL cursor failed");
                sender
                    .send(RowEvent::CursorFailed(SqlxpError::Cursor(format!(
                        "Failed to fetch row: {}",
                        format_postgres_error(&e)
                    ))))
                    .await;
                return;
            }
        };

        if !sender.send(event).await {
            tracing::debug!(rows = sent, "row consumer closed, stopping PostgreSQL cursor");
            return;
        }
        sent += 1;
    }

    tracing::debug!(rows = sent, "PostgreSQL cursor exhausted");
}

fn read_row(row: &PgRow) -> Result<Vec<Value>> {
    (0..row.len()).map(|idx| postgres_to_value(row, idx)).collect()
}
