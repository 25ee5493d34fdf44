//! Repository facade over the customer store and cache.
//!
//! # Responsibility
//! - Orchestrate store writes and cache mutations into use-case APIs.
//! - Keep request-layer callers decoupled from storage and cache details.

pub mod customer_repository;
