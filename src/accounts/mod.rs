//! Accounts Module
//!
//! User registration and credential lookup. Identities are append-only:
//! there is no update, delete or session surface, every authenticated
//! request re-checks the stored credentials.

mod handler;
mod lib;
mod routes;

pub use lib::*;
pub use routes::routes;

/// Returns the migrations for the accounts module.
///
/// These should be run during application startup to ensure the database
/// schema is up to date.
pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[("accounts_001_users.sql", include_str!("migrations/001_users.sql"))]
}
