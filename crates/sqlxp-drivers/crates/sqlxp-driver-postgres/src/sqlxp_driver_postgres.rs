//! PostgreSQL driver implementation

mod connection;
mod driver;
mod value;

pub use connection::PostgresConnection;
pub use driver::{PostgresDriver, build_postgres_config};
