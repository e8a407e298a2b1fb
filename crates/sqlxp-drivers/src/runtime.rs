//! Tokio runtime for driving async connections from synchronous code
//!
//! The CLI is synchronous: encoders block on the row channel, which must not
//! happen inside an async context. Connection setup and query start are
//! driven to completion on this runtime instead.

use sqlxp_core::{Result, SqlxpError};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

/// Global Tokio runtime for database drivers
static TOKIO_RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();

/// Get or create the shared Tokio runtime.
pub fn get_tokio_runtime() -> Result<&'static Runtime> {
    TOKIO_RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .thread_name("sqlxp-driver-runtime")
                .build()
        })
        .as_ref()
        .map_err(|e| SqlxpError::Other(format!("Failed to create Tokio runtime: {}", e)))
}

/// Run a future on the shared Tokio runtime.
///
/// This blocks the current thread until the future completes, so it must not
/// be called from within an async context.
///
/// # Example
///
/// ```ignore
/// let conn = block_on_tokio(driver.connect(&config))??;
/// ```
pub fn block_on_tokio<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    Ok(get_tokio_runtime()?.block_on(future))
}
