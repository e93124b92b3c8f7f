//! Schema registration for record types.
//!
//! A [`SchemaBuilder`] collects the declared fields of one record type and
//! [`SchemaBuilder::build`] validates them and precomputes the canonical
//! statements. The resulting [`Schema`] is immutable; record types keep a
//! single `'static` instance of it (see [`crate::Model::schema`]).
//!
//! All generated statements use `?` as the parameter token. Executors
//! translate it to the store's native form before running the statement.

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::{Field, OrmError, Row};

/// Quote an identifier with backticks.
pub(crate) fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Comma-separated list of `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Precomputed mapping and SQL for one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    model: String,
    table: String,
    mappings: IndexMap<String, Field>,
    primary_key: String,
    fields: Vec<String>,
    select_sql: String,
    find_sql: String,
    insert_sql: String,
    update_sql: Option<String>,
    delete_sql: String,
}

impl Schema {
    /// Start declaring a record type. The table name defaults to `model`.
    pub fn builder(model: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model: model.into(),
            table: None,
            declared: Vec::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Attribute name to descriptor, primary key included, in declaration order.
    pub fn mappings(&self) -> &IndexMap<String, Field> {
        &self.mappings
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.mappings.get(attr)
    }

    /// Attribute name of the primary key.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key attribute names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Column an attribute maps to: the descriptor's name override, else the attribute.
    pub fn column_name<'a>(&'a self, attr: &'a str) -> &'a str {
        self.mappings
            .get(attr)
            .and_then(Field::name)
            .unwrap_or(attr)
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// SELECT restricted to one primary key value.
    pub fn find_sql(&self) -> &str {
        &self.find_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// `None` when the type has no non-key fields to set.
    pub fn update_sql(&self) -> Option<&str> {
        self.update_sql.as_deref()
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    /// Re-key a result row from column names to attribute names.
    ///
    /// Columns that do not belong to a mapping keep their name.
    pub fn row_to_attributes(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(column, value)| {
                let attr = self
                    .mappings
                    .iter()
                    .find(|(attr, field)| field.name().unwrap_or(attr.as_str()) == column)
                    .map(|(attr, _)| attr.clone())
                    .unwrap_or(column);
                (attr, value)
            })
            .collect()
    }
}

/// Collects field declarations for one record type.
#[derive(Debug)]
pub struct SchemaBuilder {
    model: String,
    table: Option<String>,
    declared: Vec<(String, Field)>,
}

impl SchemaBuilder {
    /// Use an explicit table name instead of the model name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare a mapped attribute.
    pub fn field(mut self, attr: impl Into<String>, field: impl Into<Field>) -> Self {
        self.declared.push((attr.into(), field.into()));
        self
    }

    /// Validate the declaration and precompute its statements.
    ///
    /// Fails when no field, or more than one field, is marked as primary
    /// key, or when an attribute or column name is declared twice.
    pub fn build(self) -> Result<Schema, OrmError> {
        let table = self.table.unwrap_or_else(|| self.model.clone());
        info!(model = %self.model, table = %table, "found model");

        let mut mappings = IndexMap::with_capacity(self.declared.len());
        let mut fields = Vec::new();
        let mut primary_key: Option<String> = None;
        let mut columns = HashSet::with_capacity(self.declared.len());

        for (attr, field) in self.declared {
            debug!("found mapping: {} ==> {}", attr, field);
            if mappings.contains_key(&attr) {
                return Err(OrmError::DuplicateField {
                    model: self.model,
                    field: attr,
                });
            }
            let column = field.name().unwrap_or(&attr).to_string();
            if !columns.insert(column.clone()) {
                return Err(OrmError::DuplicateColumn {
                    model: self.model,
                    column,
                });
            }
            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(OrmError::DuplicatePrimaryKey {
                        model: self.model,
                        field: attr,
                    });
                }
                primary_key = Some(attr.clone());
            } else {
                fields.push(attr.clone());
            }
            mappings.insert(attr, field);
        }

        let Some(primary_key) = primary_key else {
            return Err(OrmError::MissingPrimaryKey { model: self.model });
        };

        let column = |attr: &str| -> String {
            quote(
                mappings
                    .get(attr)
                    .and_then(Field::name)
                    .unwrap_or(attr),
            )
        };

        let quoted_table = quote(&table);
        let key_column = column(&primary_key);
        let field_columns: Vec<String> = fields.iter().map(|f| column(f)).collect();

        let select_columns: Vec<&str> = std::iter::once(key_column.as_str())
            .chain(field_columns.iter().map(String::as_str))
            .collect();
        let select_sql = format!("select {} from {}", select_columns.join(", "), quoted_table);
        let find_sql = format!("{} where {}=?", select_sql, key_column);

        let insert_columns: Vec<&str> = field_columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(key_column.as_str()))
            .collect();
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            quoted_table,
            insert_columns.join(", "),
            placeholders(fields.len() + 1)
        );

        let update_sql = if fields.is_empty() {
            None
        } else {
            let assignments: Vec<String> =
                field_columns.iter().map(|c| format!("{}=?", c)).collect();
            Some(format!(
                "update {} set {} where {}=?",
                quoted_table,
                assignments.join(", "),
                key_column
            ))
        };

        let delete_sql = format!("delete from {} where {}=?", quoted_table, key_column);

        Ok(Schema {
            model: self.model,
            table,
            mappings,
            primary_key,
            fields,
            select_sql,
            find_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }
}
