//! sqlxp Core - shared abstractions for the query export pipeline
//!
//! This crate provides the types every other sqlxp crate depends on:
//!
//! - `Value` - a raw cell as delivered by a database driver
//! - `RowSource` - the cursor abstraction encoders drain, and `RowStream`,
//!   the channel-backed implementation drivers hand out
//! - `DatabaseDriver` / `Connection` - traits implemented per database
//! - `SqlxpError` - the error type shared by drivers and row sources

mod connection;
mod driver;
mod error;
mod row_source;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use row_source::*;
pub use types::*;
