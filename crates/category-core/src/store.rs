//! Store capabilities used by the migration.
//!
//! A source only has to read every category; a sink only has to insert one.
//! Both traits are used through generics, so after monomorphization every
//! call is statically dispatched:
//!
//! ```ignore
//! pub async fn migrate<S: CategorySource, D: CategorySink>(
//!     source: &S,
//!     destination: &D,
//!     config: &MigrationConfig,
//! ) -> Result<Summary, MigrationError> { ... }
//! ```

use anyhow::Result;
use thiserror::Error;

use crate::category::{Category, RawCategory};

/// Lower-cased phrases that identify a uniqueness violation in error text.
///
/// The first three are the required PostgreSQL phrasings and are kept as a
/// list even though `"unique constraint"` already covers
/// `"violates unique constraint"`. The rest catch other drivers.
pub const DUPLICATE_KEY_PATTERNS: &[&str] = &[
    "duplicate key",
    "unique constraint",
    "violates unique constraint",
    "duplicate entry",
    "unique violation",
];

/// Store that can return every category it holds.
#[async_trait::async_trait]
pub trait CategorySource: Send + Sync {
    /// Fetch all categories in a stable order.
    async fn fetch_all(&self) -> Result<Vec<RawCategory>>;
}

/// Store that accepts one category at a time.
#[async_trait::async_trait]
pub trait CategorySink: Send + Sync {
    /// Insert a single category, keeping its identifier verbatim.
    ///
    /// Implementations should report uniqueness violations as
    /// [`InsertError::Duplicate`] from a structured error code where the
    /// driver exposes one, and fall back to [`InsertError::classify`].
    async fn insert(&self, category: &Category) -> std::result::Result<(), InsertError>;
}

/// Why a sink rejected an insert.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The record already exists at the destination.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Anything else. Aborts the migration.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InsertError {
    /// Classify a driver error by its text.
    ///
    /// The whole error chain is inspected, since wrappers added with
    /// `context` usually hide the driver's message from `to_string()`.
    pub fn classify(err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        if is_duplicate_key_message(&message) {
            InsertError::Duplicate(message)
        } else {
            InsertError::Other(err)
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, InsertError::Duplicate(_))
    }
}

/// Whether `message` reads like a uniqueness violation.
pub fn is_duplicate_key_message(message: &str) -> bool {
    let message = message.to_lowercase();
    DUPLICATE_KEY_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}
