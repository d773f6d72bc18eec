//! MySQL source for category-sync
//!
//! Reads the whole `categories` table through `mysql_async` and hands the
//! rows to [`category_core::migrate`] as [`category_core::RawCategory`] values.

mod client;
mod row;
mod source;

pub use client::new_mysql_pool;
pub use row::{raw_category_from_row, RowConversionError};
pub use source::{MySQLCategorySource, SELECT_CATEGORIES};
