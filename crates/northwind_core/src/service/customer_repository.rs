//! Cache-aside customer repository.
//!
//! # Responsibility
//! - Normalize identifiers on every entry point.
//! - Write through the store first, then mirror confirmed writes into the
//!   shared cache.
//! - Serve reads from the cache.
//!
//! # Invariants
//! - Every cache mutation happens strictly after a confirmed store write, so
//!   a record is never cached without being stored.
//! - A failed store write leaves the cache untouched.
//! - A failed compare-and-update is reported as `UpdateOutcome::CacheStale`
//!   and the store write is never retried.

use crate::cache::customer_cache::CustomerCache;
use crate::model::customer::{
    normalize_customer_id, Customer, CustomerId, CustomerValidationError,
};
use crate::repo::customer_store::{CustomerStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store write kind, carried by `RepoError::StoreWriteFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Insert,
    Update,
    Delete,
}

impl WriteOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Typed failure outcome of a repository call.
#[derive(Debug)]
pub enum RepoError {
    /// No record for this id exists in the store.
    NotFound(CustomerId),
    /// Create attempted for an id already present in the store.
    AlreadyExists(CustomerId),
    /// Path id and body id disagree after normalization.
    IdentifierMismatch {
        path_id: CustomerId,
        body_id: CustomerId,
    },
    /// The store reported that the write did not apply.
    StoreWriteFailed {
        operation: WriteOperation,
        customer_id: CustomerId,
    },
    Validation(CustomerValidationError),
    /// Exceptional store failure; fatal to the call.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "customer not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "customer already exists: {id}"),
            Self::IdentifierMismatch { path_id, body_id } => write!(
                f,
                "customer id mismatch: path `{path_id}` does not match body `{body_id}`"
            ),
            Self::StoreWriteFailed {
                operation,
                customer_id,
            } => write!(
                f,
                "store {} did not apply for customer {customer_id}",
                operation.as_str()
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CustomerValidationError> for RepoError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// What a cache miss in `retrieve` is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Reads never consult the store after the snapshot load.
    #[default]
    CacheOnly,
    /// A miss falls back to a store read. The result is returned but not
    /// cached, so the cache only ever reflects writes made via the facade.
    StoreFallback,
}

impl ReadPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::CacheOnly => "cache_only",
            Self::StoreFallback => "store_fallback",
        }
    }
}

/// Repository facade configuration.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    pub read_policy: ReadPolicy,
}

impl RepositoryConfig {
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }
}

/// Result of a store-confirmed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Store and cache both hold the new record.
    Applied(Customer),
    /// The store holds the new record, but the cache entry changed (or was
    /// missing) before it could be swapped. The cache may lag for this id
    /// until its next successful mutation.
    CacheStale(Customer),
}

impl UpdateOutcome {
    /// Record committed to the store.
    pub fn customer(&self) -> &Customer {
        match self {
            Self::Applied(customer) | Self::CacheStale(customer) => customer,
        }
    }

    pub fn is_cache_stale(&self) -> bool {
        matches!(self, Self::CacheStale(_))
    }
}

/// Cache-aside repository for customer records.
///
/// Instances are cheap; all of them share one cache handle. The facade is
/// `Send + Sync` whenever its store is, and every method may run
/// concurrently with any other.
pub struct CustomerRepository<S: CustomerStore> {
    store: S,
    cache: Arc<CustomerCache>,
    config: RepositoryConfig,
}

impl<S: CustomerStore> CustomerRepository<S> {
    /// Creates a repository over the process-wide shared cache.
    ///
    /// # Errors
    /// - Returns `RepoError::Store` when the first snapshot load fails.
    pub fn new(store: S) -> RepoResult<Self> {
        Self::with_cache(store, CustomerCache::shared(), RepositoryConfig::default())
    }

    /// Creates a repository over an explicit cache handle.
    ///
    /// The snapshot load runs if (and only if) no earlier construction
    /// loaded this cache.
    pub fn with_cache(
        store: S,
        cache: Arc<CustomerCache>,
        config: RepositoryConfig,
    ) -> RepoResult<Self> {
        cache
            .load_once(|| store.list_customers())
            .map_err(|err| {
                error!(
                    "event=cache_load module=repo status=error error_code=snapshot_failed error={err}"
                );
                RepoError::Store(err)
            })?;

        info!(
            "event=repo_init module=repo status=ok read_policy={} cached={}",
            config.read_policy.as_str(),
            cache.len()
        );
        Ok(Self {
            store,
            cache,
            config,
        })
    }

    /// Returns the shared cache handle.
    pub fn cache(&self) -> &Arc<CustomerCache> {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates a customer and returns the stored record.
    ///
    /// # Errors
    /// - `AlreadyExists` when the store already holds the id.
    /// - `Validation` when the record is malformed.
    /// - `StoreWriteFailed` when the insert did not apply; the cache is
    ///   left untouched.
    pub fn create(&self, customer: Customer) -> RepoResult<Customer> {
        let customer = customer.normalized();
        customer.validate()?;
        let id = customer.customer_id.clone();

        if self.store.get_customer(&id)?.is_some() {
            warn!("event=customer_create module=repo status=rejected reason=already_exists customer_id={id}");
            return Err(RepoError::AlreadyExists(id));
        }

        if !self.store.insert_customer(&customer)? {
            warn!("event=customer_create module=repo status=error error_code=store_write_failed customer_id={id}");
            return Err(RepoError::StoreWriteFailed {
                operation: WriteOperation::Insert,
                customer_id: id,
            });
        }

        let stored = self.cache.insert_or_update(&id, customer);
        info!("event=customer_create module=repo status=ok customer_id={id}");
        Ok(stored)
    }

    /// Returns one customer by id from the cache.
    ///
    /// Under `ReadPolicy::StoreFallback` a cache miss reads the store.
    pub fn retrieve(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        let id = normalize_customer_id(customer_id);
        if let Some(customer) = self.cache.get(&id) {
            return Ok(Some(customer));
        }

        match self.config.read_policy {
            ReadPolicy::CacheOnly => Ok(None),
            ReadPolicy::StoreFallback => {
                let customer = self.store.get_customer(&id)?;
                if customer.is_some() {
                    warn!("event=customer_retrieve module=repo status=cache_miss source=store customer_id={id}");
                }
                Ok(customer)
            }
        }
    }

    /// Returns every cached customer in unspecified order.
    pub fn retrieve_all(&self) -> Vec<Customer> {
        self.cache.values()
    }

    /// Replaces a customer record.
    ///
    /// # Errors
    /// - `IdentifierMismatch` when `customer_id` and the body id disagree;
    ///   nothing is written.
    /// - `Validation` when the record is malformed.
    /// - `StoreWriteFailed` when the update did not apply; the cache is
    ///   left untouched.
    pub fn update(&self, customer_id: &str, customer: Customer) -> RepoResult<UpdateOutcome> {
        let path_id = normalize_customer_id(customer_id);
        let customer = customer.normalized();
        if path_id != customer.customer_id {
            return Err(RepoError::IdentifierMismatch {
                path_id,
                body_id: customer.customer_id,
            });
        }
        customer.validate()?;

        // Expected value for the swap is what the cache held before the write.
        let expected = self.cache.get(&path_id);

        if !self.store.update_customer(&customer)? {
            warn!("event=customer_update module=repo status=error error_code=store_write_failed customer_id={path_id}");
            return Err(RepoError::StoreWriteFailed {
                operation: WriteOperation::Update,
                customer_id: path_id,
            });
        }

        let swapped = expected.and_then(|expected| {
            self.cache
                .compare_and_update(&path_id, &expected, customer.clone())
        });

        match swapped {
            Some(updated) => {
                info!("event=customer_update module=repo status=ok customer_id={path_id}");
                Ok(UpdateOutcome::Applied(updated))
            }
            None => {
                warn!("event=customer_update module=repo status=cache_stale customer_id={path_id}");
                Ok(UpdateOutcome::CacheStale(customer))
            }
        }
    }

    /// Deletes a customer from the store and then from the cache.
    ///
    /// # Errors
    /// - `NotFound` when the store has no record for the id.
    /// - `StoreWriteFailed` when the delete did not apply.
    pub fn delete(&self, customer_id: &str) -> RepoResult<()> {
        let id = normalize_customer_id(customer_id);

        if self.store.get_customer(&id)?.is_none() {
            return Err(RepoError::NotFound(id));
        }

        if !self.store.delete_customer(&id)? {
            warn!("event=customer_delete module=repo status=error error_code=store_write_failed customer_id={id}");
            return Err(RepoError::StoreWriteFailed {
                operation: WriteOperation::Delete,
                customer_id: id,
            });
        }

        self.cache.remove(&id);
        info!("event=customer_delete module=repo status=ok customer_id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomerRepository, RepoError, RepositoryConfig};
    use crate::cache::customer_cache::CustomerCache;
    use crate::db::open_db_in_memory;
    use crate::model::customer::Customer;
    use crate::repo::customer_store::{CustomerStore, SqliteCustomerStore};
    use std::sync::Arc;

    fn repo() -> CustomerRepository<SqliteCustomerStore> {
        let store = SqliteCustomerStore::new(open_db_in_memory().unwrap());
        CustomerRepository::with_cache(
            store,
            Arc::new(CustomerCache::new()),
            RepositoryConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn update_with_mismatched_ids_writes_nothing() {
        let repo = repo();
        repo.create(Customer::new("ALFKI", "Alfreds Futterkiste"))
            .unwrap();

        let err = repo
            .update("alfki", Customer::new("ANATR", "Ana Trujillo"))
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::IdentifierMismatch { ref path_id, ref body_id }
                if path_id == "ALFKI" && body_id == "ANATR"
        ));
        assert!(repo.store().get_customer("ANATR").unwrap().is_none());
        assert_eq!(
            repo.retrieve("ALFKI").unwrap().unwrap().company_name,
            "Alfreds Futterkiste"
        );
    }

    #[test]
    fn update_missing_from_cache_reports_cache_stale() {
        let repo = repo();
        // Row exists only in the store: the cache never saw it.
        repo.store()
            .insert_customer(&Customer::new("ANATR", "Ana Trujillo"))
            .unwrap();

        let outcome = repo
            .update("anatr", Customer::new("anatr", "Ana Trujillo Emparedados"))
            .unwrap();
        assert!(outcome.is_cache_stale());
        assert_eq!(outcome.customer().customer_id, "ANATR");
        assert!(repo.retrieve("ANATR").unwrap().is_none());
        assert_eq!(
            repo.store().get_customer("ANATR").unwrap().unwrap().company_name,
            "Ana Trujillo Emparedados"
        );
    }
}
