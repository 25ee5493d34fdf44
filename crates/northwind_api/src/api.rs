//! Use-case API for HTTP-facing callers.
//!
//! # Responsibility
//! - Expose list/get/create/update/delete over the customer repository.
//! - Translate repository outcomes into status codes and response bodies.
//!
//! # Invariants
//! - Exported functions never panic; every failure becomes a response.
//! - Fatal store errors map to 500, expected failures to 400/404.
//! - Delete write failures answer with a problem-details body.

use log::{error, warn};
use northwind_core::{
    normalize_customer_id, Customer, CustomerRepository, CustomerStore, RepoError, UpdateOutcome,
};
use serde::Serialize;

/// Route prefix used for `Location` ids and problem-details instances.
pub const CUSTOMERS_ROUTE: &str = "api/customers";
const PROBLEM_TYPE_DELETE_FAILED: &str = "https://localhost:5001/customers/failed-to-delete";

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Structured error payload (RFC 7807 shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemDetails {
    pub status: u16,
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub detail: String,
    pub instance: String,
}

/// Response payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiBody {
    Empty,
    Customer(Customer),
    Customers(Vec<Customer>),
    Message(String),
    Problem(ProblemDetails),
}

/// Transport-agnostic response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ApiBody,
    /// Route of the created resource, set on 201 only.
    pub location: Option<String>,
}

impl ApiResponse {
    fn new(status: u16, body: ApiBody) -> Self {
        Self {
            status,
            body,
            location: None,
        }
    }

    fn no_content() -> Self {
        Self::new(STATUS_NO_CONTENT, ApiBody::Empty)
    }

    fn not_found() -> Self {
        Self::new(STATUS_NOT_FOUND, ApiBody::Empty)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, ApiBody::Message(message.into()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Serializes the body; `None` for bodiless responses.
    pub fn body_json(&self) -> Result<Option<String>, serde_json::Error> {
        match &self.body {
            ApiBody::Empty => Ok(None),
            body => serde_json::to_string(body).map(Some),
        }
    }
}

/// Customers resource over one repository facade.
pub struct CustomersApi<S: CustomerStore> {
    repo: CustomerRepository<S>,
}

impl<S: CustomerStore> CustomersApi<S> {
    pub fn new(repo: CustomerRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &CustomerRepository<S> {
        &self.repo
    }

    /// Parses a JSON request body; blank bodies count as missing.
    pub fn parse_body(raw: Option<&str>) -> Result<Option<Customer>, ApiResponse> {
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|err| ApiResponse::bad_request(format!("Invalid customer body: {err}")))
    }

    /// Lists cached customers, optionally filtered by exact country.
    ///
    /// Always 200; the list may be empty.
    pub fn list_customers(&self, country: Option<&str>) -> ApiResponse {
        let customers = self.repo.retrieve_all();
        let customers = match country.filter(|country| !country.trim().is_empty()) {
            None => customers,
            Some(country) => customers
                .into_iter()
                .filter(|customer| customer.country.as_deref() == Some(country))
                .collect(),
        };
        ApiResponse::new(STATUS_OK, ApiBody::Customers(customers))
    }

    pub fn get_customer(&self, customer_id: &str) -> ApiResponse {
        match self.repo.retrieve(customer_id) {
            Ok(Some(customer)) => ApiResponse::new(STATUS_OK, ApiBody::Customer(customer)),
            Ok(None) => ApiResponse::not_found(),
            Err(err) => map_repo_error(err),
        }
    }

    /// Creates a customer; 201 with the stored record on success.
    pub fn create_customer(&self, body: Option<Customer>) -> ApiResponse {
        let Some(customer) = body else {
            return ApiResponse::bad_request("Missing customer body.");
        };

        match self.repo.create(customer) {
            Ok(created) => {
                let location = format!(
                    "{CUSTOMERS_ROUTE}/{}",
                    created.customer_id.to_ascii_lowercase()
                );
                ApiResponse {
                    status: STATUS_CREATED,
                    body: ApiBody::Customer(created),
                    location: Some(location),
                }
            }
            Err(RepoError::AlreadyExists(_)) => {
                ApiResponse::bad_request("Customer already exists!")
            }
            Err(RepoError::StoreWriteFailed { .. }) => {
                ApiResponse::bad_request("Cannot create new customer!")
            }
            Err(err) => map_repo_error(err),
        }
    }

    /// Replaces a customer; 204 on success.
    pub fn update_customer(&self, customer_id: &str, body: Option<Customer>) -> ApiResponse {
        let Some(customer) = body else {
            return ApiResponse::bad_request("Missing customer body.");
        };

        let path_id = normalize_customer_id(customer_id);
        if path_id != normalize_customer_id(&customer.customer_id) {
            return ApiResponse::bad_request(format!(
                "Customer id `{path_id}` does not match body id."
            ));
        }
        match self.repo.retrieve(&path_id) {
            Ok(Some(_)) => {}
            Ok(None) => return ApiResponse::not_found(),
            Err(err) => return map_repo_error(err),
        }

        match self.repo.update(&path_id, customer) {
            Ok(UpdateOutcome::Applied(_)) => ApiResponse::no_content(),
            Ok(UpdateOutcome::CacheStale(_)) => {
                warn!("event=api_update module=api status=cache_stale customer_id={path_id}");
                ApiResponse::no_content()
            }
            Err(RepoError::StoreWriteFailed { .. }) => ApiResponse::bad_request(format!(
                "Customer {path_id} was found but failed to update"
            )),
            Err(err) => map_repo_error(err),
        }
    }

    /// Deletes a customer; 204 on success.
    pub fn delete_customer(&self, customer_id: &str) -> ApiResponse {
        let path_id = normalize_customer_id(customer_id);
        match self.repo.retrieve(&path_id) {
            Ok(Some(_)) => {}
            Ok(None) => return ApiResponse::not_found(),
            Err(err) => return map_repo_error(err),
        }

        match self.repo.delete(&path_id) {
            Ok(()) => ApiResponse::no_content(),
            Err(RepoError::StoreWriteFailed { .. }) => ApiResponse::new(
                STATUS_BAD_REQUEST,
                ApiBody::Problem(ProblemDetails {
                    status: STATUS_BAD_REQUEST,
                    problem_type: PROBLEM_TYPE_DELETE_FAILED.to_string(),
                    title: format!("Customer {path_id} found but failed to delete"),
                    detail: "The store did not apply the delete; the cached record is unchanged."
                        .to_string(),
                    instance: format!("/{CUSTOMERS_ROUTE}/{}", customer_id.trim()),
                }),
            ),
            Err(err) => map_repo_error(err),
        }
    }
}

fn map_repo_error(err: RepoError) -> ApiResponse {
    match err {
        RepoError::NotFound(_) => ApiResponse::not_found(),
        RepoError::AlreadyExists(_)
        | RepoError::IdentifierMismatch { .. }
        | RepoError::Validation(_)
        | RepoError::StoreWriteFailed { .. } => ApiResponse::bad_request(err.to_string()),
        RepoError::Store(store_err) => {
            error!("event=api_request module=api status=error error_code=store_failure error={store_err}");
            ApiResponse::new(
                STATUS_INTERNAL_ERROR,
                ApiBody::Message("Customer store is unavailable.".to_string()),
            )
        }
    }
}
