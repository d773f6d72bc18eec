//! The category migration loop.
//!
//! This module reads the whole source table, validates each row and writes
//! it to the destination one row at a time:
//!
//! source.fetch_all() → RawCategory::validate() → destination.insert()
//!
//! Invalid rows and rows that already exist at the destination are skipped.
//! Any other insert failure stops the run; rows written before it stay.

use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::{CategorySink, CategorySource, InsertError};

/// Number of successful inserts between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Options for a single migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Emit a progress message every time this many rows have been inserted.
    pub progress_interval: NonZeroUsize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Outcome of a completed migration.
///
/// `success + skipped == total` for every summary returned by [`migrate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Rows inserted into the destination.
    pub success: usize,
    /// Rows with an invalid category type or already present at the destination.
    pub skipped: usize,
    /// Rows fetched from the source.
    pub total: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} successful, {} skipped, {} total",
            self.success, self.skipped, self.total
        )
    }
}

/// Fatal migration failures.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Reading from the source failed; nothing was written.
    #[error("failed to read categories from source")]
    Fetch(#[source] anyhow::Error),

    /// A non-duplicate insert failure. `index` is 1-based.
    #[error("failed to insert category {index} (ID: {id})")]
    Insert {
        index: usize,
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Copy every valid, not-yet-present category from `source` to `destination`.
pub async fn migrate<S, D>(
    source: &S,
    destination: &D,
    config: &MigrationConfig,
) -> Result<Summary, MigrationError>
where
    S: CategorySource + ?Sized,
    D: CategorySink + ?Sized,
{
    let categories = source.fetch_all().await.map_err(MigrationError::Fetch)?;

    if categories.is_empty() {
        info!("No categories found in source database");
        return Ok(Summary::default());
    }

    let total = categories.len();
    info!("Found {} categories to migrate", total);

    let mut summary = Summary {
        total,
        ..Summary::default()
    };

    for (position, raw) in categories.into_iter().enumerate() {
        let index = position + 1;
        let id = raw.id.clone();

        let category = match raw.validate() {
            Ok(category) => category,
            Err(invalid) => {
                warn!(
                    "Skipping category {} (ID: {}) with invalid category_type: {}",
                    index, id, invalid.0
                );
                summary.skipped += 1;
                continue;
            }
        };

        match destination.insert(&category).await {
            Ok(()) => {
                summary.success += 1;
                debug!("Inserted category {} (ID: {})", index, id);

                if summary.success % config.progress_interval.get() == 0 {
                    info!(
                        "Migrated {}/{} categories ({} successful, {} skipped)...",
                        index, total, summary.success, summary.skipped
                    );
                }
            }
            Err(InsertError::Duplicate(message)) => {
                warn!(
                    "Category {} (ID: {}) already exists in destination, skipping: {}",
                    index, id, message
                );
                summary.skipped += 1;
            }
            Err(InsertError::Other(source)) => {
                return Err(MigrationError::Insert { index, id, source });
            }
        }
    }

    info!("Migration summary: {}", summary);
    Ok(summary)
}
