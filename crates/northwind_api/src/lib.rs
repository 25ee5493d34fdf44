//! Request surface for the customers resource.
//!
//! Maps repository outcomes to transport-level statuses so an HTTP layer can
//! forward them without knowing about the cache or the store.

pub mod api;

pub use api::{ApiBody, ApiResponse, CustomersApi, ProblemDetails, CUSTOMERS_ROUTE};
