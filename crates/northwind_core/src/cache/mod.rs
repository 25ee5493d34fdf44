//! Process-local customer cache.
//!
//! # Responsibility
//! - Mirror store contents keyed by normalized customer id.
//! - Offer lock-free reads and atomic single-key mutations.
//!
//! # Invariants
//! - The cache is a full, unbounded mirror; entries are never evicted.
//! - The snapshot load runs at most once successfully per cache instance.

pub mod customer_cache;
