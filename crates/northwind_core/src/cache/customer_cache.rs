//! Lock-free customer cache with a one-time snapshot loader.
//!
//! # Responsibility
//! - Store customers in a `papaya::HashMap` so readers never block writers.
//! - Provide compare-and-update so a writer cannot clobber a concurrent
//!   change it has not observed.
//! - Guard the initial bulk load with a one-time initializer.
//!
//! # Invariants
//! - Keys are canonical (upper-case) customer ids.
//! - `compare_and_update` never inserts a missing key.
//! - Once `is_loaded()` returns `true` it never flips back.

use crate::model::customer::{Customer, CustomerId};
use log::{debug, info};
use once_cell::sync::{Lazy, OnceCell};
use papaya::{Compute, HashMap as PapayaHashMap, Operation};
use std::sync::Arc;

static SHARED_CACHE: Lazy<Arc<CustomerCache>> = Lazy::new(|| Arc::new(CustomerCache::new()));

/// Concurrent mirror of the customer store.
#[derive(Debug, Default)]
pub struct CustomerCache {
    entries: PapayaHashMap<CustomerId, Customer>,
    loaded: OnceCell<usize>,
}

impl CustomerCache {
    /// Creates an empty, unloaded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache instance.
    ///
    /// The instance is created on first call and lives for the process
    /// lifetime.
    pub fn shared() -> Arc<CustomerCache> {
        Arc::clone(&SHARED_CACHE)
    }

    /// Runs `loader` and bulk-inserts its records unless a load already
    /// succeeded.
    ///
    /// Concurrent callers block until the single running loader finishes.
    /// When the loader fails the cache stays unloaded and the error is
    /// returned, so a later caller may retry. Returns the number of records
    /// inserted by the successful load.
    pub fn load_once<E>(
        &self,
        loader: impl FnOnce() -> Result<Vec<Customer>, E>,
    ) -> Result<usize, E> {
        self.loaded
            .get_or_try_init(|| {
                let customers = loader()?;
                let count = customers.len();
                let guard = self.entries.pin();
                for customer in customers {
                    let customer = customer.normalized();
                    guard.insert(customer.customer_id.clone(), customer);
                }
                info!("event=cache_load module=cache status=ok records={count}");
                Ok(count)
            })
            .copied()
    }

    /// Returns whether the snapshot load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn get(&self, customer_id: &str) -> Option<Customer> {
        self.entries.pin().get(customer_id).cloned()
    }

    /// Inserts or replaces an entry and returns the stored value.
    pub fn insert_or_update(&self, customer_id: &str, customer: Customer) -> Customer {
        let guard = self.entries.pin();
        guard.insert(customer_id.to_string(), customer.clone());
        customer
    }

    /// Replaces the entry only if it still equals `expected`.
    ///
    /// Returns the new value on success, `None` when the key is missing or
    /// holds a different value.
    pub fn compare_and_update(
        &self,
        customer_id: &str,
        expected: &Customer,
        customer: Customer,
    ) -> Option<Customer> {
        let guard = self.entries.pin();
        let result = guard.compute(customer_id.to_string(), |entry| match entry {
            Some((_, current)) if current == expected => Operation::Insert(customer.clone()),
            _ => Operation::Abort(()),
        });

        match result {
            Compute::Updated { new: (_, value), .. } => Some(value.clone()),
            _ => {
                debug!(
                    "event=cache_compare_update module=cache status=skipped customer_id={customer_id}"
                );
                None
            }
        }
    }

    /// Removes an entry; a missing key is a no-op.
    pub fn remove(&self, customer_id: &str) {
        self.entries.pin().remove(customer_id);
    }

    /// Snapshot of all cached customers in unspecified order.
    pub fn values(&self) -> Vec<Customer> {
        self.entries.pin().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
