//! Conversion from MySQL rows to [`RawCategory`].
//!
//! Values are read as raw [`mysql_async::Value`]s and converted by hand. The
//! text protocol returns nearly everything as `Value::Bytes`, so each
//! extractor accepts both the binary-protocol variant and its textual form.

use category_core::RawCategory;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use mysql_async::{Row, Value};
use thiserror::Error;

/// Error while converting a `categories` row.
#[derive(Debug, Error)]
pub enum RowConversionError {
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),
    #[error("Unexpected NULL in column {0}")]
    UnexpectedNull(&'static str),
    #[error("Type mismatch in column {column}: expected {expected}, got {actual:?}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
        actual: Value,
    },
    #[error("Invalid UTF-8 in column {column}: {source}")]
    InvalidUtf8 {
        column: &'static str,
        source: std::string::FromUtf8Error,
    },
    #[error("Invalid date/time value in column {column}: {value}")]
    InvalidDateTime { column: &'static str, value: String },
}

/// Convert one row of the categories query into a [`RawCategory`].
///
/// Columns are looked up by name, so the select list order does not matter.
pub fn raw_category_from_row(mut row: Row) -> Result<RawCategory, RowConversionError> {
    Ok(RawCategory {
        id: extract_string("id", take(&mut row, "id")?)?,
        name: extract_string("name", take(&mut row, "name")?)?,
        category_type: extract_string("category_type", take(&mut row, "category_type")?)?,
        created_at: extract_datetime("created_at", take(&mut row, "created_at")?)?,
        updated_at: extract_datetime("updated_at", take(&mut row, "updated_at")?)?,
        deleted_at: optional(take(&mut row, "deleted_at")?)
            .map(|v| extract_datetime("deleted_at", v))
            .transpose()?,
        user_uuid: extract_string("user_uuid", take(&mut row, "user_uuid")?)?,
        description: optional(take(&mut row, "description")?)
            .map(|v| extract_string("description", v))
            .transpose()?,
        hidden: extract_bool("hidden", take(&mut row, "hidden")?)?,
    })
}

fn take(row: &mut Row, column: &'static str) -> Result<Value, RowConversionError> {
    row.take::<Value, _>(column)
        .ok_or(RowConversionError::MissingColumn(column))
}

fn optional(value: Value) -> Option<Value> {
    match value {
        Value::NULL => None,
        other => Some(other),
    }
}

/// Extract text. Integer ids are rendered in decimal.
fn extract_string(column: &'static str, value: Value) -> Result<String, RowConversionError> {
    match value {
        Value::Bytes(bytes) => String::from_utf8(bytes)
            .map_err(|source| RowConversionError::InvalidUtf8 { column, source }),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::NULL => Err(RowConversionError::UnexpectedNull(column)),
        other => Err(RowConversionError::TypeMismatch {
            column,
            expected: "string",
            actual: other,
        }),
    }
}

/// Extract a DATETIME/TIMESTAMP, interpreting it as UTC.
fn extract_datetime(
    column: &'static str,
    value: Value,
) -> Result<DateTime<Utc>, RowConversionError> {
    match value {
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let invalid = || RowConversionError::InvalidDateTime {
                column,
                value: format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}.{micro:06}"
                ),
            };
            let naive = NaiveDateTime::new(
                NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                    .ok_or_else(invalid)?,
                NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                    .ok_or_else(invalid)?,
            );
            Ok(Utc.from_utc_datetime(&naive))
        }
        Value::Bytes(bytes) => {
            let s = String::from_utf8(bytes)
                .map_err(|source| RowConversionError::InvalidUtf8 { column, source })?;
            if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
                return Ok(Utc.from_utc_datetime(&naive));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                return Ok(Utc.from_utc_datetime(&naive));
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                return Ok(dt.with_timezone(&Utc));
            }
            Err(RowConversionError::InvalidDateTime { column, value: s })
        }
        Value::NULL => Err(RowConversionError::UnexpectedNull(column)),
        other => Err(RowConversionError::TypeMismatch {
            column,
            expected: "datetime",
            actual: other,
        }),
    }
}

/// Extract a TINYINT(1)/BOOLEAN or BIT(1) flag. Any non-zero integer is true.
fn extract_bool(column: &'static str, value: Value) -> Result<bool, RowConversionError> {
    match value {
        Value::Int(i) => Ok(i != 0),
        Value::UInt(u) => Ok(u != 0),
        // BIT(1) arrives as a single raw byte
        Value::Bytes(ref bytes) if bytes[..] == [0u8] => Ok(false),
        Value::Bytes(ref bytes) if bytes[..] == [1u8] => Ok(true),
        Value::Bytes(bytes) => {
            let s = String::from_utf8(bytes)
                .map_err(|source| RowConversionError::InvalidUtf8 { column, source })?;
            match s.trim().parse::<i64>() {
                Ok(n) => Ok(n != 0),
                Err(_) => Err(RowConversionError::TypeMismatch {
                    column,
                    expected: "boolean",
                    actual: Value::Bytes(s.into_bytes()),
                }),
            }
        }
        Value::NULL => Err(RowConversionError::UnexpectedNull(column)),
        other => Err(RowConversionError::TypeMismatch {
            column,
            expected: "boolean",
            actual: other,
        }),
    }
}
