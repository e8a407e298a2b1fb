//! SQLite driver implementation

use async_trait::async_trait;
use sqlxp_core::{Connection, ConnectionConfig, DatabaseDriver, Result, SqlxpError};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sqlite3"]
    }

    /// Any connection string that is not a server URL is a database path.
    fn accepts_dsn(&self, _dsn: &str) -> bool {
        true
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").or_else(|| config.get_string("dsn")).as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config
            .get_string("path")
            .or_else(|| config.get_string("dsn"))
            .ok_or_else(|| {
                SqlxpError::Configuration(
                    "SQLite requires a database path. Example: sqlxp ./app.db -q 'select 1'".into(),
                )
            })?;

        let conn = SqliteConnection::open(&path)?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_path() {
        let driver = SqliteDriver::new();
        let result = driver.connect(&ConnectionConfig::new("sqlite")).await;
        assert!(matches!(result, Err(SqlxpError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_connect_in_memory_and_ping() {
        let driver = SqliteDriver::new();
        let config = ConnectionConfig::from_dsn("sqlite", ":memory:");
        driver.test_connection(&config).await.unwrap();
    }

    #[test]
    fn test_accepts_any_path() {
        let driver = SqliteDriver::new();
        assert!(driver.accepts_dsn("./data/app.db"));
        assert_eq!(driver.aliases(), &["sqlite3"]);
        assert_eq!(driver.default_port(), None);
    }
}
