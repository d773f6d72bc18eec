//! Category records as they flow from source to destination.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The closed set of category types a destination accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryType {
    Income,
    Expense,
    Transfer,
}

impl CategoryType {
    /// All allowed values, in declaration order.
    pub const ALL: [CategoryType; 3] = [
        CategoryType::Income,
        CategoryType::Expense,
        CategoryType::Transfer,
    ];

    /// Canonical spelling, as stored in both databases.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "Income",
            CategoryType::Expense => "Expense",
            CategoryType::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category type value outside of [`CategoryType::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid category_type: {0}")]
pub struct InvalidCategoryType(pub String);

impl FromStr for CategoryType {
    type Err = InvalidCategoryType;

    // Exact match only; "income" or " Income" are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Income" => Ok(CategoryType::Income),
            "Expense" => Ok(CategoryType::Expense),
            "Transfer" => Ok(CategoryType::Transfer),
            other => Err(InvalidCategoryType(other.to_string())),
        }
    }
}

/// A category row exactly as the source returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCategory {
    pub id: String,
    pub name: String,
    /// Unvalidated; see [`RawCategory::validate`].
    pub category_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_uuid: String,
    pub description: Option<String>,
    pub hidden: bool,
}

/// A category whose type is known to be one of [`CategoryType::ALL`].
///
/// Only [`RawCategory::validate`] produces this, so a sink never sees an
/// invalid type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub category_type: CategoryType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_uuid: String,
    pub description: Option<String>,
    pub hidden: bool,
}

impl RawCategory {
    /// Check the category type and move every other field over unchanged.
    pub fn validate(self) -> Result<Category, InvalidCategoryType> {
        let category_type = self.category_type.parse()?;
        Ok(Category {
            id: self.id,
            name: self.name,
            category_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            user_uuid: self.user_uuid,
            description: self.description,
            hidden: self.hidden,
        })
    }
}

impl From<Category> for RawCategory {
    fn from(category: Category) -> Self {
        RawCategory {
            id: category.id,
            name: category.name,
            category_type: category.category_type.as_str().to_string(),
            created_at: category.created_at,
            updated_at: category.updated_at,
            deleted_at: category.deleted_at,
            user_uuid: category.user_uuid,
            description: category.description,
            hidden: category.hidden,
        }
    }
}
