//! Catalog Module
//!
//! Books, their reviews, and the read-side queries over them: full listing,
//! case-insensitive substring search, per-book review listing and the
//! top-rated ranking. Catalog records are append-only; nothing here updates
//! or deletes.

mod handler;
mod lib;
mod routes;

pub use lib::*;
pub use routes::routes;

/// Returns the migrations for the catalog module.
///
/// These should be run during application startup to ensure the database
/// schema is up to date.
pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[("catalog_001_schema.sql", include_str!("migrations/001_schema.sql"))]
}
