//! Driver registry for managing available database drivers

use sqlxp_core::DatabaseDriver;
use std::sync::Arc;

/// Registry of available database drivers.
///
/// Drivers are kept in registration order; [`DriverRegistry::detect`] asks
/// each in turn, so catch-all drivers must be registered last.
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver::new()));
        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
        // Accepts any path, so it goes last.
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a new driver, replacing any driver with the same name
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name();
        tracing::debug!(driver = %name, "registering database driver");
        self.drivers.retain(|existing| existing.name() != name);
        self.drivers.push(driver);
    }

    /// Get a driver by its canonical name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self
            .drivers
            .iter()
            .find(|driver| driver.name() == name)
            .cloned();
        if driver.is_none() {
            tracing::debug!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Look a driver up by name or alias, ignoring case
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let name = name.trim().to_lowercase();
        self.drivers
            .iter()
            .find(|driver| {
                driver.name() == name || driver.aliases().iter().any(|alias| *alias == name)
            })
            .cloned()
    }

    /// Infer the driver a connection string belongs to
    pub fn detect(&self, dsn: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self
            .drivers
            .iter()
            .find(|driver| driver.accepts_dsn(dsn))
            .cloned();
        if let Some(driver) = &driver {
            tracing::debug!(driver = driver.name(), "detected driver from connection string");
        }
        driver
    }

    /// List all registered driver names
    pub fn list(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|driver| driver.name()).collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
