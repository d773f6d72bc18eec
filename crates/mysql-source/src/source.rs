//! MySQL implementation of [`CategorySource`].

use anyhow::{Context, Result};
use category_core::{sanitize_connection_string, CategorySource, RawCategory};
use mysql_async::{prelude::*, Pool, Row};
use tracing::{debug, info, warn};

use crate::client::new_mysql_pool;
use crate::row::raw_category_from_row;

/// Query used to read the source table.
///
/// Ordered by creation time, then id, so repeated runs see the same sequence.
pub const SELECT_CATEGORIES: &str = "
    SELECT id, name, category_type, created_at, updated_at, deleted_at,
           user_uuid, description, hidden
    FROM categories
    ORDER BY created_at, id";

/// Reads categories from a MySQL database.
pub struct MySQLCategorySource {
    pool: Pool,
    display_uri: String,
}

impl MySQLCategorySource {
    /// Create the connection pool and check that the server answers.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let source = Self {
            pool: new_mysql_pool(connection_string)?,
            display_uri: sanitize_connection_string(connection_string),
        };
        if let Err(e) = source.verify().await {
            source.close().await;
            return Err(e);
        }
        Ok(source)
    }

    /// Check out a connection and ping the server.
    pub async fn verify(&self) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .with_context(|| format!("Failed to connect to MySQL at '{}'", self.display_uri))?;
        conn.ping()
            .await
            .with_context(|| format!("Failed to ping MySQL at '{}'", self.display_uri))?;
        info!("Connected to MySQL at {}", self.display_uri);
        Ok(())
    }

    /// Disconnect every pooled connection. Errors are logged, not returned.
    pub async fn close(self) {
        if let Err(e) = self.pool.disconnect().await {
            warn!("Failed to disconnect MySQL pool cleanly: {}", e);
        } else {
            debug!("Disconnected MySQL pool");
        }
    }
}

#[async_trait::async_trait]
impl CategorySource for MySQLCategorySource {
    async fn fetch_all(&self) -> Result<Vec<RawCategory>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .context("Failed to get MySQL connection")?;

        let rows: Vec<Row> = conn
            .query(SELECT_CATEGORIES)
            .await
            .context("Failed to read categories from MySQL")?;
        debug!("Read {} rows from MySQL categories table", rows.len());

        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                raw_category_from_row(row)
                    .with_context(|| format!("Failed to convert MySQL row {}", i + 1))
            })
            .collect()
    }
}
