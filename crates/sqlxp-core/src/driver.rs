//! Database driver trait definition

use crate::{Connection, Result, SqlxpError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "postgres", "mysql", "sqlite")
    fn name(&self) -> &'static str;

    /// Human-readable name (e.g., "PostgreSQL", "MySQL", "SQLite")
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Alternative names accepted on the command line
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Default connection port (None for file-based databases like SQLite)
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Whether a connection string looks like it belongs to this driver
    fn accepts_dsn(&self, dsn: &str) -> bool;

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Connect and ping, then close again
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!(driver = self.name(), "testing connection");
        let conn = self.connect(config).await?;
        conn.ping().await?;
        conn.close().await
    }
}

/// Connection configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "postgres", "mysql", "sqlite")
    pub driver: String,
    /// Host address (empty for file-based databases)
    pub host: String,
    /// Port number (0 for default or file-based)
    pub port: u16,
    /// Database name or file path
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Driver-specific connection string; takes precedence over the fields above
    pub dsn: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            ..Default::default()
        }
    }

    /// Create a configuration from a raw connection string
    pub fn from_dsn(driver: &str, dsn: &str) -> Self {
        let mut config = Self::new(driver);
        config.dsn = Some(dsn.to_string());
        config
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Create a server configuration (PostgreSQL, MySQL)
    pub fn new_server(
        driver: &str,
        host: &str,
        port: u16,
        database: &str,
        username: &str,
        password: &str,
    ) -> Self {
        let mut config = Self::new(driver);
        config.host = host.to_string();
        config.port = port;
        config.database = Some(database.to_string());
        config.username = Some(username.to_string());
        config.password = Some(password.to_string());
        config
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        // First check params
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        // Check known fields
        match key {
            "host" if !self.host.is_empty() => Some(self.host.clone()),
            "database" | "path" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            "dsn" => self.dsn.clone(),
            _ => None,
        }
    }

    /// Port to use, falling back to `default` when unset
    pub fn port_or(&self, default: u16) -> u16 {
        if self.port > 0 { self.port } else { default }
    }

    /// Database name, or a configuration error naming the driver
    pub fn require_database(&self) -> Result<&str> {
        self.database.as_deref().filter(|db| !db.is_empty()).ok_or_else(|| {
            SqlxpError::Configuration(format!(
                "{} connection requires a database name",
                self.driver
            ))
        })
    }
}
