//! PostgreSQL client utilities

use anyhow::{Context, Result};
use category_core::sanitize_connection_string;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::error;

/// Connect to PostgreSQL and spawn the connection driver task.
///
/// The returned handle finishes once the client is dropped.
pub async fn new_postgresql_client(connection_string: &str) -> Result<(Client, JoinHandle<()>)> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to PostgreSQL at '{}'",
                sanitize_connection_string(connection_string)
            )
        })?;

    // Spawn the connection task
    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok((client, handle))
}
