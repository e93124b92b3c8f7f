//! Argument binding and row decoding for SQLite.
//!
//! SQLite values carry a storage class rather than the declared column type,
//! so decoding looks at the declared type first (for `boolean` and
//! `datetime` columns) and falls back to the storage class.

use chrono::{DateTime, Utc};
use minorm::{OrmError, Row, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo, ValueRef};

fn decode_error(column: &str, e: sqlx::Error) -> OrmError {
    OrmError::Decode(format!("column `{}`: {}", column, e))
}

/// Bind positional arguments in order.
pub(crate) fn bind_arguments(values: &[Value]) -> Result<SqliteArguments<'static>, OrmError> {
    let mut args = SqliteArguments::default();
    for value in values {
        match value {
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(*b),
            Value::Int(i) => args.add(*i),
            Value::Float(f) => args.add(*f),
            Value::String(s) => args.add(s.clone()),
            Value::Datetime(dt) => args.add(*dt),
        }
        .map_err(|e| OrmError::Store(e.to_string()))?;
    }
    Ok(args)
}

/// Decode every column of a row, keyed by column name.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Row, OrmError> {
    let mut decoded = Row::with_capacity(row.columns().len());
    for (idx, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let raw = row.try_get_raw(idx).map_err(|e| decode_error(name, e))?;
        if raw.is_null() {
            decoded.insert(name.to_string(), Value::Null);
            continue;
        }
        let stored = raw.type_info();

        let value = match (col.type_info().name(), stored.name()) {
            ("BOOLEAN", "INTEGER") => Value::Bool(
                row.try_get_unchecked(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
            ("DATETIME", _) => match row.try_get_unchecked::<DateTime<Utc>, _>(idx) {
                Ok(dt) => Value::Datetime(dt),
                Err(_) => Value::String(
                    row.try_get_unchecked(idx)
                        .map_err(|e| decode_error(name, e))?,
                ),
            },
            (_, "INTEGER") => Value::Int(
                row.try_get_unchecked(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
            (_, "REAL") => Value::Float(
                row.try_get_unchecked(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
            (_, "BLOB") => {
                let bytes: Vec<u8> = row.try_get_unchecked(idx).map_err(|e| decode_error(name, e))?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => Value::String(
                row.try_get_unchecked(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
        };
        decoded.insert(name.to_string(), value);
    }
    Ok(decoded)
}
