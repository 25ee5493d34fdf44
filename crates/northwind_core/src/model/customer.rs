//! Customer domain model.
//!
//! # Responsibility
//! - Define the customer record served by the repository facade.
//! - Normalize identifiers into their canonical upper-case form.
//! - Validate field shapes before persistence.
//!
//! # Invariants
//! - `customer_id` is compared and stored upper-case.
//! - `customer_id` is exactly five ASCII alphanumeric characters.
//! - `company_name` is required and non-blank.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CUSTOMER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{5}$").expect("valid customer id regex"));

const COMPANY_NAME_MAX_CHARS: usize = 40;
const CONTACT_MAX_CHARS: usize = 30;
const ADDRESS_MAX_CHARS: usize = 60;
const LOCALITY_MAX_CHARS: usize = 15;
const POSTAL_CODE_MAX_CHARS: usize = 10;
const PHONE_MAX_CHARS: usize = 24;

/// Canonical (upper-case) customer identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CustomerId = String;

/// Returns the canonical form of a caller-supplied identifier.
///
/// Surrounding whitespace is dropped and ASCII letters are upper-cased, so
/// `"alfki"`, `" AlFkI "` and `"ALFKI"` all map to `"ALFKI"`.
pub fn normalize_customer_id(raw: &str) -> CustomerId {
    raw.trim().to_ascii_uppercase()
}

/// Field-level validation failure for a customer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    /// Identifier does not match the fixed five-character format.
    InvalidCustomerId(String),
    /// Company name is empty after trimming.
    MissingCompanyName,
    /// A field exceeds its maximum length.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCustomerId(value) => write!(
                f,
                "invalid customer id `{value}`; expected 5 alphanumeric characters"
            ),
            Self::MissingCompanyName => write!(f, "company name is required"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "field `{field}` is {actual_chars} characters long; maximum is {max_chars}"
            ),
        }
    }
}

impl Error for CustomerValidationError {}

/// Customer record as stored, cached and served.
///
/// Everything except `customer_id` is opaque to the caching logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Sole key. Canonical form is upper-case.
    pub customer_id: CustomerId,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
}

impl Customer {
    /// Creates a customer with only the required fields set.
    ///
    /// The identifier is kept exactly as given; the repository facade
    /// normalizes it on every write path.
    pub fn new(customer_id: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            company_name: company_name.into(),
            contact_name: None,
            contact_title: None,
            address: None,
            city: None,
            region: None,
            postal_code: None,
            country: None,
            phone: None,
            fax: None,
        }
    }

    /// Builder-style setter for `country`.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Builder-style setter for `contact_name`.
    pub fn with_contact(mut self, contact_name: impl Into<String>) -> Self {
        self.contact_name = Some(contact_name.into());
        self
    }

    /// Builder-style setter for `city`.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Rewrites `customer_id` into its canonical form in place.
    pub fn normalize_id(&mut self) {
        self.customer_id = normalize_customer_id(&self.customer_id);
    }

    /// Returns a copy with a canonical identifier.
    pub fn normalized(mut self) -> Self {
        self.normalize_id();
        self
    }

    /// Validates identifier format and field lengths.
    ///
    /// Expects an already normalized identifier; a lower-case id is
    /// reported as invalid.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if !CUSTOMER_ID_RE.is_match(&self.customer_id) {
            return Err(CustomerValidationError::InvalidCustomerId(
                self.customer_id.clone(),
            ));
        }

        if self.company_name.trim().is_empty() {
            return Err(CustomerValidationError::MissingCompanyName);
        }
        check_len("company_name", Some(&self.company_name), COMPANY_NAME_MAX_CHARS)?;

        check_len("contact_name", self.contact_name.as_deref(), CONTACT_MAX_CHARS)?;
        check_len("contact_title", self.contact_title.as_deref(), CONTACT_MAX_CHARS)?;
        check_len("address", self.address.as_deref(), ADDRESS_MAX_CHARS)?;
        check_len("city", self.city.as_deref(), LOCALITY_MAX_CHARS)?;
        check_len("region", self.region.as_deref(), LOCALITY_MAX_CHARS)?;
        check_len("postal_code", self.postal_code.as_deref(), POSTAL_CODE_MAX_CHARS)?;
        check_len("country", self.country.as_deref(), LOCALITY_MAX_CHARS)?;
        check_len("phone", self.phone.as_deref(), PHONE_MAX_CHARS)?;
        check_len("fax", self.fax.as_deref(), PHONE_MAX_CHARS)?;

        Ok(())
    }
}

fn check_len(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), CustomerValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(CustomerValidationError::FieldTooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_customer_id, Customer, CustomerValidationError};

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_customer_id("alfki"), "ALFKI");
        assert_eq!(normalize_customer_id(" AlFkI "), "ALFKI");
        assert_eq!(normalize_customer_id("ALFKI"), "ALFKI");
    }

    #[test]
    fn validate_accepts_minimal_record() {
        Customer::new("ALFKI", "Alfreds Futterkiste")
            .validate()
            .expect("minimal record should be valid");
    }

    #[test]
    fn validate_rejects_non_canonical_or_malformed_ids() {
        for id in ["alfki", "ALFK", "ALFKIX", "AL-KI", ""] {
            let err = Customer::new(id, "Company").validate().unwrap_err();
            assert!(matches!(err, CustomerValidationError::InvalidCustomerId(_)));
        }
    }

    #[test]
    fn validate_rejects_blank_company_name() {
        let err = Customer::new("ALFKI", "   ").validate().unwrap_err();
        assert_eq!(err, CustomerValidationError::MissingCompanyName);
    }

    #[test]
    fn validate_rejects_overlong_country() {
        let customer = Customer::new("ALFKI", "Company").with_country("A".repeat(16));
        let err = customer.validate().unwrap_err();
        assert_eq!(
            err,
            CustomerValidationError::FieldTooLong {
                field: "country",
                max_chars: 15,
                actual_chars: 16,
            }
        );
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(Customer::new("ALFKI", "Alfreds Futterkiste")).unwrap();
        assert_eq!(json["customerId"], "ALFKI");
        assert_eq!(json["companyName"], "Alfreds Futterkiste");
        assert!(json["country"].is_null());
    }
}
