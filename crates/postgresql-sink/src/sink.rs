//! PostgreSQL implementation of [`CategorySink`].

use anyhow::{Context, Result};
use category_core::{sanitize_connection_string, Category, CategorySink, InsertError};
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;
use tracing::{debug, info, warn};

use crate::client::new_postgresql_client;

/// Single-row insert into the destination table.
///
/// Identifiers and the category type are bound as text and cast by the
/// server, so the destination can use `uuid` and a `category_type` enum.
pub const INSERT_CATEGORY: &str = "
    INSERT INTO categories (
        id, name, category_type, created_at, updated_at,
        deleted_at, user_uuid, description, hidden
    ) VALUES (
        $1::text::uuid, $2, $3::text::category_type, $4::timestamptz, $5::timestamptz,
        $6::timestamptz, $7::text::uuid, $8, $9
    )";

/// Writes categories into a PostgreSQL database.
pub struct PostgreSQLCategorySink {
    client: Client,
    connection: JoinHandle<()>,
    display_uri: String,
}

impl PostgreSQLCategorySink {
    /// Connect and check that the server answers.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = new_postgresql_client(connection_string).await?;
        let sink = Self {
            client,
            connection,
            display_uri: sanitize_connection_string(connection_string),
        };
        if let Err(e) = sink.verify().await {
            sink.close().await;
            return Err(e);
        }
        Ok(sink)
    }

    /// Run a trivial query.
    pub async fn verify(&self) -> Result<()> {
        self.client
            .simple_query("SELECT 1")
            .await
            .with_context(|| format!("Failed to ping PostgreSQL at '{}'", self.display_uri))?;
        info!("Connected to PostgreSQL at {}", self.display_uri);
        Ok(())
    }

    /// Drop the client and wait for the connection task to finish.
    pub async fn close(self) {
        drop(self.client);
        match self.connection.await {
            Ok(()) => debug!("Closed PostgreSQL connection"),
            Err(e) => warn!("PostgreSQL connection task did not shut down cleanly: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl CategorySink for PostgreSQLCategorySink {
    async fn insert(&self, category: &Category) -> std::result::Result<(), InsertError> {
        self.client
            .execute(
                INSERT_CATEGORY,
                &[
                    &category.id,
                    &category.name,
                    &category.category_type.as_str(),
                    &category.created_at,
                    &category.updated_at,
                    &category.deleted_at,
                    &category.user_uuid,
                    &category.description,
                    &category.hidden,
                ],
            )
            .await
            .map_err(classify_postgres_error)?;
        Ok(())
    }
}

/// Map a driver error onto [`InsertError`].
///
/// SQLSTATE 23505 is authoritative. Errors without a code (or with a
/// different one) still go through the text fallback, which catches
/// uniqueness violations surfaced by poolers or proxies.
pub fn classify_postgres_error(err: tokio_postgres::Error) -> InsertError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let message = match err.as_db_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        return InsertError::Duplicate(message);
    }
    InsertError::classify(anyhow::Error::new(err).context("PostgreSQL insert failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_binds_every_column() {
        let columns = [
            "id",
            "name",
            "category_type",
            "created_at",
            "updated_at",
            "deleted_at",
            "user_uuid",
            "description",
            "hidden",
        ];
        for column in columns {
            assert!(INSERT_CATEGORY.contains(column), "missing {column}");
        }
        for param in 1..=columns.len() {
            assert!(INSERT_CATEGORY.contains(&format!("${param}")));
        }
        assert!(!INSERT_CATEGORY.contains("$10"));
    }

    #[test]
    fn test_identifiers_are_cast_not_generated() {
        assert!(INSERT_CATEGORY.contains("$1::text::uuid"));
        assert!(INSERT_CATEGORY.contains("$7::text::uuid"));
        assert!(INSERT_CATEGORY.contains("$3::text::category_type"));
        assert!(!INSERT_CATEGORY.to_lowercase().contains("default"));
        assert!(!INSERT_CATEGORY.to_lowercase().contains("on conflict"));
    }

    #[test]
    fn test_unique_violation_code() {
        assert_eq!(SqlState::UNIQUE_VIOLATION.code(), "23505");
    }
}
