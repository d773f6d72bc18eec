//! Core types for category-sync.
//!
//! This crate holds everything the migration needs that is independent of
//! a particular database driver:
//!
//! - [`CategoryType`] - the closed set of allowed category types
//! - [`RawCategory`] / [`Category`] - a row as read, and a row as validated
//! - [`CategorySource`] / [`CategorySink`] - the capabilities a store provides
//! - [`migrate`] - the extract-validate-load loop producing a [`Summary`]
//!
//! # Architecture
//!
//! ```text
//! category-core (this crate)
//!    │
//!    ├─── category-sync-mysql       (implements CategorySource)
//!    └─── category-sync-postgresql  (implements CategorySink)
//! ```
//!
//! Driver crates only have to produce [`RawCategory`] values and accept
//! [`Category`] values. Validation and skip/abort policy live here.

pub mod category;
pub mod connection;
pub mod migrate;
pub mod store;
pub mod testing;

pub use category::{Category, CategoryType, InvalidCategoryType, RawCategory};
pub use connection::sanitize_connection_string;
pub use migrate::{migrate, MigrationConfig, MigrationError, Summary, DEFAULT_PROGRESS_INTERVAL};
pub use store::{CategorySink, CategorySource, InsertError};
