//! PostgreSQL driver implementation

use async_trait::async_trait;
use sqlxp_core::{Connection, ConnectionConfig, DatabaseDriver, Result, SqlxpError};
use std::sync::Arc;
use tokio_postgres::config::SslMode;

use crate::PostgresConnection;

const DEFAULT_PORT: u16 = 5432;

/// PostgreSQL database driver
pub struct PostgresDriver;

impl PostgresDriver {
    /// Create a new PostgreSQL driver instance
    pub fn new() -> Self {
        tracing::debug!("PostgreSQL driver initialized");
        Self
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a tokio-postgres configuration.
///
/// A DSN may be a `postgres://` URL or a `key=value` string. Without one the
/// individual fields are used, with `sslmode` taken from the parameters
/// (default `prefer`).
pub fn build_postgres_config(config: &ConnectionConfig) -> Result<tokio_postgres::Config> {
    if let Some(dsn) = config.dsn.as_deref() {
        return dsn.parse::<tokio_postgres::Config>().map_err(|e| {
            SqlxpError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
        });
    }

    let mut pg_config = tokio_postgres::Config::new();
    let host = if config.host.is_empty() {
        "localhost"
    } else {
        config.host.as_str()
    };
    pg_config
        .host(host)
        .port(config.port_or(DEFAULT_PORT))
        .dbname(config.require_database()?);

    if let Some(user) = config.username.as_deref() {
        pg_config.user(user);
    }
    if let Some(password) = config.password.as_deref() {
        pg_config.password(password);
    }

    let ssl_mode = match config
        .get_string("sslmode")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "disable" => SslMode::Disable,
        "require" | "verify-ca" | "verify-full" => SslMode::Require,
        _ => SslMode::Prefer,
    };
    pg_config.ssl_mode(ssl_mode);

    Ok(pg_config)
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn display_name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["pg", "postgresql"]
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    fn accepts_dsn(&self, dsn: &str) -> bool {
        dsn.starts_with("postgres://") || dsn.starts_with("postgresql://")
    }

    #[tracing::instrument(skip(self, config), fields(host = %config.host, port = config.port))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let pg_config = build_postgres_config(config)?;

        let conn = PostgresConnection::connect(pg_config).await?;

        tracing::info!("PostgreSQL connection created");
        Ok(Arc::new(conn))
    }
}
