//! Customer store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-record CRUD over canonical `customers` storage.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Write methods return `Ok(true)` only when exactly one row changed.
//! - Duplicate inserts and writes to missing rows return `Ok(false)`.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::customer::{Customer, CustomerValidationError};
use log::{error, warn};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

const CUSTOMER_SELECT_SQL: &str = "SELECT
    customer_id,
    company_name,
    contact_name,
    contact_title,
    address,
    city,
    region,
    postal_code,
    country,
    phone,
    fax
FROM customers";

pub type StoreResult<T> = Result<T, StoreError>;

/// Exceptional store failure (unreachable database, corrupt rows).
///
/// Ordinary "write did not apply" results are not errors; see
/// [`CustomerStore`].
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
    /// A previous caller panicked while holding the connection.
    ConnectionPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
            Self::ConnectionPoisoned => write!(f, "customer store connection is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::ConnectionPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CustomerValidationError> for StoreError {
    fn from(value: CustomerValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Durable customer storage used by the repository facade.
///
/// Identifiers passed in are expected to be normalized already.
pub trait CustomerStore: Send + Sync {
    fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>>;
    fn insert_customer(&self, customer: &Customer) -> StoreResult<bool>;
    fn update_customer(&self, customer: &Customer) -> StoreResult<bool>;
    fn delete_customer(&self, customer_id: &str) -> StoreResult<bool>;
    fn list_customers(&self) -> StoreResult<Vec<Customer>>;
}

impl<T: CustomerStore + ?Sized> CustomerStore for Arc<T> {
    fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>> {
        (**self).get_customer(customer_id)
    }

    fn insert_customer(&self, customer: &Customer) -> StoreResult<bool> {
        (**self).insert_customer(customer)
    }

    fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        (**self).update_customer(customer)
    }

    fn delete_customer(&self, customer_id: &str) -> StoreResult<bool> {
        (**self).delete_customer(customer_id)
    }

    fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        (**self).list_customers()
    }
}

/// SQLite-backed customer store.
///
/// Owns one connection; calls are serialized on it because
/// `rusqlite::Connection` is not `Sync`.
pub struct SqliteCustomerStore {
    conn: Mutex<Connection>,
}

impl SqliteCustomerStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            error!("event=store_lock module=store status=error error_code=connection_poisoned");
            StoreError::ConnectionPoisoned
        })
    }
}

impl CustomerStore for SqliteCustomerStore {
    fn get_customer(&self, customer_id: &str) -> StoreResult<Option<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE customer_id = ?1;"))?;

        let mut rows = stmt.query([customer_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_customer_row(row)?));
        }

        Ok(None)
    }

    fn insert_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO customers (
                customer_id,
                company_name,
                contact_name,
                contact_title,
                address,
                city,
                region,
                postal_code,
                country,
                phone,
                fax
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                customer.customer_id.as_str(),
                customer.company_name.as_str(),
                customer.contact_name.as_deref(),
                customer.contact_title.as_deref(),
                customer.address.as_deref(),
                customer.city.as_deref(),
                customer.region.as_deref(),
                customer.postal_code.as_deref(),
                customer.country.as_deref(),
                customer.phone.as_deref(),
                customer.fax.as_deref(),
            ],
        );

        match result {
            Ok(changed) => Ok(changed == 1),
            Err(err) if is_constraint_violation(&err) => {
                warn!(
                    "event=store_insert module=store status=rejected customer_id={} error={}",
                    customer.customer_id, err
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE customers
             SET
                company_name = ?1,
                contact_name = ?2,
                contact_title = ?3,
                address = ?4,
                city = ?5,
                region = ?6,
                postal_code = ?7,
                country = ?8,
                phone = ?9,
                fax = ?10
             WHERE customer_id = ?11;",
            params![
                customer.company_name.as_str(),
                customer.contact_name.as_deref(),
                customer.contact_title.as_deref(),
                customer.address.as_deref(),
                customer.city.as_deref(),
                customer.region.as_deref(),
                customer.postal_code.as_deref(),
                customer.country.as_deref(),
                customer.phone.as_deref(),
                customer.fax.as_deref(),
                customer.customer_id.as_str(),
            ],
        )?;

        Ok(changed == 1)
    }

    fn delete_customer(&self, customer_id: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM customers WHERE customer_id = ?1;",
            [customer_id],
        )?;

        Ok(changed == 1)
    }

    fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{CUSTOMER_SELECT_SQL} ORDER BY customer_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();

        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }

        Ok(customers)
    }
}

fn parse_customer_row(row: &Row<'_>) -> StoreResult<Customer> {
    let customer = Customer {
        customer_id: row.get("customer_id")?,
        company_name: row.get("company_name")?,
        contact_name: row.get("contact_name")?,
        contact_title: row.get("contact_title")?,
        address: row.get("address")?,
        city: row.get("city")?,
        region: row.get("region")?,
        postal_code: row.get("postal_code")?,
        country: row.get("country")?,
        phone: row.get("phone")?,
        fax: row.get("fax")?,
    };
    customer.validate()?;
    Ok(customer)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation
    )
}
