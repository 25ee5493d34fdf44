//! Store adapter layer: the durable, authoritative side of the repository.
//!
//! # Responsibility
//! - Define the per-record CRUD contract the repository facade depends on.
//! - Isolate SQLite query details from cache/facade orchestration.
//!
//! # Invariants
//! - Every call is atomic for its single record; no multi-record transaction
//!   is offered.
//! - "Nothing changed" is reported as `Ok(false)`, distinct from transport
//!   errors.

pub mod customer_store;
