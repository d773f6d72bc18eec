//! PostgreSQL destination for category-sync
//!
//! Writes validated [`category_core::Category`] values one row at a time and
//! reports uniqueness violations as [`category_core::InsertError::Duplicate`].

mod client;
mod sink;

pub use client::new_postgresql_client;
pub use sink::{classify_postgres_error, PostgreSQLCategorySink, INSERT_CATEGORY};
