//! Record types and their CRUD verbs.
//!
//! A record type implements [`Model`] (normally via `#[derive(Model)]`), which
//! supplies its [`Schema`] plus name-keyed access to its fields. The provided
//! async methods build on those and on an [`Executor`] passed in by the caller.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::schema::{placeholders, quote};
use crate::{Executor, OrmError, Row, Schema, Value};

/// LIMIT clause of a [`FindAll`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `limit ?`
    Count(u64),
    /// `limit ?, ?` bound as (offset, count).
    OffsetCount(u64, u64),
}

impl Limit {
    fn args(self) -> Result<Vec<Value>, OrmError> {
        match self {
            Limit::Count(n) => Ok(vec![to_value(n)?]),
            Limit::OffsetCount(offset, count) => Ok(vec![to_value(offset)?, to_value(count)?]),
        }
    }
}

fn to_value(n: u64) -> Result<Value, OrmError> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| OrmError::InvalidLimit(n.to_string()))
}

fn limit_part(value: &Value) -> Result<u64, OrmError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(n.unsigned_abs()),
        other => Err(OrmError::InvalidLimit(other.to_string())),
    }
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::OffsetCount(offset, count)
    }
}

/// A single non-negative integer.
impl TryFrom<Value> for Limit {
    type Error = OrmError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        limit_part(&value).map(Limit::Count)
    }
}

/// One integer (count) or two integers (offset, count).
impl TryFrom<&[Value]> for Limit {
    type Error = OrmError;

    fn try_from(values: &[Value]) -> Result<Self, Self::Error> {
        match values {
            [count] => Ok(Limit::Count(limit_part(count)?)),
            [offset, count] => Ok(Limit::OffsetCount(limit_part(offset)?, limit_part(count)?)),
            _ => Err(OrmError::InvalidLimit(format!(
                "({})",
                values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Options for [`Model::find_all`]: where fragment, order by fragment and limit.
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    filter: Option<String>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal WHERE fragment (without the keyword) and its `?` arguments.
    pub fn filter<I, V>(mut self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter = Some(fragment.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Literal ORDER BY fragment, e.g. `created_at desc`.
    pub fn order_by(mut self, fragment: impl Into<String>) -> Self {
        self.order_by = Some(fragment.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Limit from untyped input such as request parameters.
    ///
    /// Accepts one or two non-negative integers.
    pub fn try_limit(mut self, values: &[Value]) -> Result<Self, OrmError> {
        self.limit = Some(Limit::try_from(values)?);
        Ok(self)
    }

    /// Compose the statement and its argument list against `schema`.
    ///
    /// Fails when a limit does not fit a signed 64-bit parameter.
    pub fn to_sql(&self, schema: &Schema) -> Result<(String, Vec<Value>), OrmError> {
        let mut sql = vec![schema.select_sql().to_string()];
        let mut args = self.args.clone();

        if let Some(filter) = &self.filter {
            sql.push("where".to_string());
            sql.push(filter.clone());
        }
        if let Some(order_by) = &self.order_by {
            sql.push("order by".to_string());
            sql.push(order_by.clone());
        }
        if let Some(limit) = self.limit {
            sql.push("limit".to_string());
            let limit_args = limit.args()?;
            sql.push(placeholders(limit_args.len()));
            args.extend(limit_args);
        }

        Ok((sql.join(" "), args))
    }
}

fn check_affected(schema: &Schema, verb: &str, rows: u64) {
    if rows != 1 {
        warn!(
            model = %schema.model_name(),
            rows,
            "failed to {} by primary key: affected rows: {}",
            verb,
            rows
        );
    }
}

/// A record type mapped to one table.
///
/// Implementors provide the schema and name-keyed field access. `get`
/// returns `None` for an attribute the type does not map, and
/// `Some(Value::Null)` for a mapped attribute with no value.
#[async_trait]
pub trait Model: Sized + Send + Sync + 'static {
    /// The shared, once-computed schema of this type.
    fn schema() -> &'static Schema;

    /// Current value of a mapped attribute.
    fn get(&self, attr: &str) -> Option<Value>;

    /// Assign a mapped attribute.
    fn set(&mut self, attr: &str, value: Value) -> Result<(), OrmError>;

    /// Build an instance from a row keyed by attribute name.
    fn from_row(row: Row) -> Result<Self, OrmError>;

    /// Current value, or `Value::Null` when the attribute is unset.
    fn value(&self, attr: &str) -> Result<Value, OrmError> {
        self.get(attr).ok_or_else(|| OrmError::UnknownField {
            model: Self::schema().model_name().to_string(),
            field: attr.to_string(),
        })
    }

    /// Current value, falling back to the field default when unset.
    ///
    /// A resolved default is written back onto the instance.
    fn value_or_default(&mut self, attr: &str) -> Result<Value, OrmError> {
        let value = self.value(attr)?;
        if !value.is_null() {
            return Ok(value);
        }
        let Some(default) = Self::schema().field(attr).and_then(|f| f.default()) else {
            return Ok(value);
        };
        let value = default.resolve();
        debug!("using default value for {}: {}", attr, value);
        self.set(attr, value.clone())?;
        Ok(value)
    }

    /// Find by primary key. `None` when no row matches.
    async fn find<E, K>(executor: &E, key: K) -> Result<Option<Self>, OrmError>
    where
        E: Executor + ?Sized,
        K: Into<Value> + Send,
    {
        let schema = Self::schema();
        let rows = executor
            .select(schema.find_sql(), &[key.into()], Some(1))
            .await?;
        match rows.into_iter().next() {
            Some(row) => Self::from_row(schema.row_to_attributes(row)).map(Some),
            None => Ok(None),
        }
    }

    /// Find every row matching `query`. Empty when nothing matches.
    async fn find_all<E>(executor: &E, query: FindAll) -> Result<Vec<Self>, OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema();
        let (sql, args) = query.to_sql(schema)?;
        let rows = executor.select(&sql, &args, None).await?;
        rows.into_iter()
            .map(|row| Self::from_row(schema.row_to_attributes(row)))
            .collect()
    }

    /// `select <expr> _num_ from <table> [where ...]`, returning `_num_`.
    async fn find_number<E>(
        executor: &E,
        select_expr: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Option<Value>, OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema();
        let mut sql = format!(
            "select {} _num_ from {}",
            select_expr,
            quote(schema.table_name())
        );
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        let rows = executor.select(&sql, &args, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.shift_remove("_num_")))
    }

    /// Insert this record, resolving defaults for unset fields.
    async fn save<E>(&mut self, executor: &E) -> Result<(), OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema();
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for attr in schema.fields() {
            args.push(self.value_or_default(attr)?);
        }
        args.push(self.value_or_default(schema.primary_key())?);

        let rows = executor.execute(schema.insert_sql(), &args, true).await?;
        check_affected(schema, "insert", rows);
        Ok(())
    }

    /// Write current field values to the row with this record's key.
    async fn update<E>(&self, executor: &E) -> Result<(), OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema();
        let Some(update_sql) = schema.update_sql() else {
            debug!(model = %schema.model_name(), "no fields to update");
            return Ok(());
        };
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for attr in schema.fields() {
            args.push(self.value(attr)?);
        }
        args.push(self.value(schema.primary_key())?);

        let rows = executor.execute(update_sql, &args, true).await?;
        check_affected(schema, "update", rows);
        Ok(())
    }

    /// Delete the row with this record's key.
    async fn remove<E>(&self, executor: &E) -> Result<(), OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema();
        let args = [self.value(schema.primary_key())?];
        let rows = executor.execute(schema.delete_sql(), &args, true).await?;
        check_affected(schema, "remove", rows);
        Ok(())
    }
}
