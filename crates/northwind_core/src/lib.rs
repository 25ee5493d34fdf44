//! Core domain logic for the Northwind customer service.
//! This crate owns the cache-aside repository and its consistency rules.

pub mod cache;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::customer_cache::CustomerCache;
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingSettings,
};
pub use model::customer::{
    normalize_customer_id, Customer, CustomerId, CustomerValidationError,
};
pub use repo::customer_store::{CustomerStore, SqliteCustomerStore, StoreError, StoreResult};
pub use service::customer_repository::{
    CustomerRepository, ReadPolicy, RepoError, RepoResult, RepositoryConfig, UpdateOutcome,
    WriteOperation,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
