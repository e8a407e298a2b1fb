//! sqlxp Drivers - Database driver implementations
//!
//! This crate re-exports the per-database driver crates enabled through
//! cargo features and provides the [`DriverRegistry`] used to pick one from a
//! driver name or a connection string.

#[cfg(feature = "mysql")]
pub use sqlxp_driver_mysql as mysql;
#[cfg(feature = "postgres")]
pub use sqlxp_driver_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use sqlxp_driver_sqlite as sqlite;

mod registry;
mod runtime;

pub use registry::DriverRegistry;
pub use runtime::{block_on_tokio, get_tokio_runtime};

/// Re-export commonly used types from sqlxp-core
pub use sqlxp_core::{
    Connection, ConnectionConfig, DatabaseDriver, Result, RowSource, RowStream, SqlxpError, Value,
};
