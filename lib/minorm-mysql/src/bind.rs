//! Argument binding and row decoding for MySQL.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use minorm::{OrmError, Row, Value};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo, ValueRef};

fn bind_error(e: impl std::fmt::Display) -> OrmError {
    OrmError::Store(e.to_string())
}

fn decode_error(column: &str, e: sqlx::Error) -> OrmError {
    OrmError::Decode(format!("column `{}`: {}", column, e))
}

/// Bind positional arguments in order.
pub(crate) fn bind_arguments(values: &[Value]) -> Result<MySqlArguments, OrmError> {
    let mut args = MySqlArguments::default();
    for value in values {
        match value {
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(*b),
            Value::Int(i) => args.add(*i),
            Value::Float(f) => args.add(*f),
            Value::String(s) => args.add(s.clone()),
            Value::Datetime(dt) => args.add(*dt),
        }
        .map_err(bind_error)?;
    }
    Ok(args)
}

/// Decode every column of a row, keyed by column name.
pub(crate) fn decode_row(row: &MySqlRow) -> Result<Row, OrmError> {
    let mut decoded = Row::with_capacity(row.columns().len());
    for (idx, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let raw = row.try_get_raw(idx).map_err(|e| decode_error(name, e))?;
        if raw.is_null() {
            decoded.insert(name.to_string(), Value::Null);
            continue;
        }

        let type_name = col.type_info().name();
        let value = match type_name {
            "BOOLEAN" => Value::Bool(row.try_get(idx).map_err(|e| decode_error(name, e))?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                Value::Int(row.try_get::<i64, _>(idx).map_err(|e| decode_error(name, e))?)
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => {
                let n: u64 = row.try_get(idx).map_err(|e| decode_error(name, e))?;
                let n = i64::try_from(n).map_err(|_| {
                    OrmError::Decode(format!("column `{}`: {} overflows i64", name, n))
                })?;
                Value::Int(n)
            }
            "FLOAT" => Value::Float(f64::from(
                row.try_get::<f32, _>(idx)
                    .map_err(|e| decode_error(name, e))?,
            )),
            "DOUBLE" => Value::Float(row.try_get(idx).map_err(|e| decode_error(name, e))?),
            "DATETIME" | "TIMESTAMP" => Value::Datetime(
                row.try_get::<DateTime<Utc>, _>(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
            "DATE" => Value::String(
                row.try_get::<NaiveDate, _>(idx)
                    .map_err(|e| decode_error(name, e))?
                    .to_string(),
            ),
            "TIME" => Value::String(
                row.try_get::<NaiveTime, _>(idx)
                    .map_err(|e| decode_error(name, e))?
                    .to_string(),
            ),
            t if t.contains("BLOB") || t.contains("BINARY") => {
                let bytes: Vec<u8> = row.try_get_unchecked(idx).map_err(|e| decode_error(name, e))?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            // VARCHAR, CHAR, TEXT, DECIMAL, JSON, ENUM
            _ => Value::String(
                row.try_get_unchecked::<String, _>(idx)
                    .map_err(|e| decode_error(name, e))?,
            ),
        };
        decoded.insert(name.to_string(), value);
    }
    Ok(decoded)
}
