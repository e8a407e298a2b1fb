//! MySQL driver implementation

use async_trait::async_trait;
use mysql_async::OptsBuilder;
use sqlxp_core::{Connection, ConnectionConfig, DatabaseDriver, Result};
use std::sync::Arc;

use crate::MySqlConnection;
use crate::dsn::{DEFAULT_PORT, GoDsn, MySqlAddress, is_mysql_dsn, opts_from_dsn};

/// MySQL database driver
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection options from a DSN, or from the individual fields when there
/// is none.
pub fn build_mysql_opts(config: &ConnectionConfig) -> Result<OptsBuilder> {
    if let Some(dsn) = config.dsn.as_deref() {
        return opts_from_dsn(dsn);
    }

    let host = if config.host.is_empty() {
        "localhost".to_string()
    } else {
        config.host.clone()
    };

    let dsn = GoDsn {
        user: config.username.clone(),
        password: config.password.clone(),
        address: MySqlAddress::Tcp {
            host,
            port: config.port_or(DEFAULT_PORT),
        },
        database: Some(config.require_database()?.to_string()),
        params: config
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };
    Ok(dsn.to_opts_builder())
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn display_name(&self) -> &'static str {
        "MySQL"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["mariadb", "maria"]
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    fn accepts_dsn(&self, dsn: &str) -> bool {
        is_mysql_dsn(dsn)
    }

    #[tracing::instrument(skip(self, config), fields(host = %config.host, database = config.database.as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let opts = build_mysql_opts(config)?;

        let conn = MySqlConnection::connect(opts).await?;

        tracing::info!("MySQL connection created");
        Ok(Arc::new(conn))
    }
}
