//! MySQL/MariaDB driver implementation

mod connection;
mod driver;
mod dsn;

pub use connection::MySqlConnection;
pub use driver::{MySqlDriver, build_mysql_opts};
pub use dsn::{GoDsn, MySqlAddress, is_mysql_dsn, opts_from_dsn};
