//! In-memory stores for exercising [`migrate`](crate::migrate) without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};

use crate::category::{Category, RawCategory};
use crate::store::{CategorySink, CategorySource, InsertError};

/// Build a source row with fixed timestamps and the given id/type.
pub fn category(id: &str, category_type: &str) -> RawCategory {
    RawCategory {
        id: id.to_string(),
        name: format!("Category {id}"),
        category_type: category_type.to_string(),
        created_at: Utc.timestamp_opt(1_704_164_645, 0).single().unwrap_or_default(),
        updated_at: Utc
            .timestamp_opt(1_706_929_506, 123_456_000)
            .single()
            .unwrap_or_default(),
        deleted_at: None,
        user_uuid: "0190a3c4-7e1f-7000-8000-0000000000ff".to_string(),
        description: None,
        hidden: false,
    }
}

/// Source backed by a vector, or one that always fails.
#[derive(Debug, Clone)]
pub struct MemorySource {
    rows: Vec<RawCategory>,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new(rows: Vec<RawCategory>) -> Self {
        Self {
            rows,
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            rows: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CategorySource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<RawCategory>> {
        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.rows.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct SinkState {
    rows: Vec<Category>,
    attempts: Vec<String>,
}

/// Sink that keeps rows in insertion order and enforces a unique `id`.
///
/// Uniqueness violations are reported with PostgreSQL's wording and
/// classified through [`InsertError::classify`], the same fallback a real
/// driver adapter uses.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<SinkState>,
    failures: HashMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the sink, as if a previous run had written these rows.
    pub fn with_existing(rows: Vec<Category>) -> Self {
        Self {
            state: Mutex::new(SinkState {
                rows,
                attempts: Vec::new(),
            }),
            failures: HashMap::new(),
        }
    }

    /// Make inserts of `id` fail with a non-duplicate error.
    pub fn fail_on(mut self, id: &str, message: &str) -> Self {
        self.failures.insert(id.to_string(), message.to_string());
        self
    }

    pub fn rows(&self) -> Vec<Category> {
        self.lock().rows.clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.lock().rows.iter().map(|c| c.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    /// Number of insert calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.lock().attempts.len()
    }

    /// Ids passed to insert, in call order.
    pub fn attempted_ids(&self) -> Vec<String> {
        self.lock().attempts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl CategorySink for MemorySink {
    async fn insert(&self, category: &Category) -> std::result::Result<(), InsertError> {
        let mut state = self.lock();
        state.attempts.push(category.id.clone());

        if let Some(message) = self.failures.get(&category.id) {
            return Err(InsertError::Other(anyhow!("{message}")));
        }

        if state.rows.iter().any(|existing| existing.id == category.id) {
            return Err(InsertError::classify(anyhow!(
                "duplicate key value violates unique constraint \"categories_pkey\""
            )));
        }

        state.rows.push(category.clone());
        Ok(())
    }
}
