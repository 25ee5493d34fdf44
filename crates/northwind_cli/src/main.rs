//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `northwind_core` linkage.
//! - Optionally open a database file and report the snapshot size.
//!
//! Usage: `northwind_cli [DB_PATH]`. Logging is enabled when
//! `NORTHWIND_LOG_DIR` is set.

use northwind_core::db::open_db;
use northwind_core::{CustomerRepository, LoggingSettings, SqliteCustomerStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("northwind_core ping={}", northwind_core::ping());
    println!("northwind_core version={}", northwind_core::core_version());

    match LoggingSettings::from_env() {
        Ok(Some(settings)) => {
            if let Err(err) = northwind_core::init_logging_with(&settings) {
                eprintln!("logging disabled: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    match CustomerRepository::new(SqliteCustomerStore::new(conn)) {
        Ok(repo) => {
            println!("customers cached={}", repo.cache().len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to load customers: {err}");
            ExitCode::FAILURE
        }
    }
}
