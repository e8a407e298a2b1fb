//! Connection trait

use crate::{Result, RowStream};
use async_trait::async_trait;

/// A live, read-only database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgres", "mysql")
    fn driver_name(&self) -> &str;

    /// Round-trip to the server to verify the connection is usable
    async fn ping(&self) -> Result<()>;

    /// Execute a query and return a cursor over its rows.
    ///
    /// The column set is resolved before this returns, so a query that fails
    /// to prepare is reported here rather than by the stream. Rows are read
    /// lazily by a producer task and handed over through a bounded channel.
    async fn query_rows(&self, sql: &str) -> Result<RowStream>;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}
