//! Customer domain model.
//!
//! # Responsibility
//! - Define the canonical customer record shared by store, cache and facade.
//! - Own identifier normalization and record validation rules.
//!
//! # Invariants
//! - Every customer is identified by one upper-case `CustomerId`.
//! - Only validated records are ever written to the store.

pub mod customer;
