//! Field descriptors: one mapped column each.
//!
//! A [`Field`] holds the column type, primary-key flag, optional column name
//! override and optional default. The typed builders ([`StringField`],
//! [`IntegerField`], ...) fix the column type and the defaults for each
//! scalar kind. Boolean, text and datetime builders have no `primary_key`
//! method, so those kinds can never be declared as keys.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::Value;

/// The scalar kind a descriptor was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
    Datetime,
}

impl FieldKind {
    /// Name used in the descriptor's display form.
    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::String => "StringField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Integer => "IntegerField",
            FieldKind::Float => "FloatField",
            FieldKind::Text => "TextField",
            FieldKind::Datetime => "DatetimeField",
        }
    }

    /// Default column type for this kind.
    pub fn column_type(self) -> &'static str {
        match self {
            FieldKind::String => "varchar(100)",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "bigint",
            FieldKind::Float => "real",
            FieldKind::Text => "text",
            FieldKind::Datetime => "datetime",
        }
    }
}

/// A field default: a literal, or a producer invoked each time it is needed.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Metadata for one mapped column.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    name: Option<String>,
    column_type: String,
    primary_key: bool,
    default: Option<DefaultValue>,
}

impl Field {
    fn new(kind: FieldKind, default: Option<DefaultValue>) -> Self {
        Self {
            kind,
            name: None,
            column_type: kind.column_type().to_string(),
            primary_key: false,
            default,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Column name override, if one was declared.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}:{}>",
            self.kind.type_name(),
            self.column_type,
            self.name.as_deref().unwrap_or_default()
        )
    }
}

macro_rules! field_builder {
    ($(#[$meta:meta])* $builder:ident, $kind:expr, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $builder(Field);

        #[allow(clippy::new_without_default)]
        impl $builder {
            pub fn new() -> Self {
                Self(Field::new($kind, $default))
            }

            /// Map to a column name other than the attribute name.
            pub fn name(mut self, name: impl Into<String>) -> Self {
                self.0.name = Some(name.into());
                self
            }

            pub fn default(mut self, value: impl Into<Value>) -> Self {
                self.0.default = Some(DefaultValue::Literal(value.into()));
                self
            }

            /// Default computed on each insert that needs it.
            pub fn default_with<F>(mut self, produce: F) -> Self
            where
                F: Fn() -> Value + Send + Sync + 'static,
            {
                self.0.default = Some(DefaultValue::Producer(Arc::new(produce)));
                self
            }

            /// Drop the kind's built-in default.
            pub fn no_default(mut self) -> Self {
                self.0.default = None;
                self
            }
        }

        impl From<$builder> for Field {
            fn from(builder: $builder) -> Self {
                builder.0
            }
        }
    };
}

field_builder!(
    /// `varchar(100)` column, no default.
    StringField,
    FieldKind::String,
    None
);
field_builder!(
    /// `boolean` column, defaults to `false`.
    BooleanField,
    FieldKind::Boolean,
    Some(DefaultValue::Literal(Value::Bool(false)))
);
field_builder!(
    /// `bigint` column, defaults to `0`.
    IntegerField,
    FieldKind::Integer,
    Some(DefaultValue::Literal(Value::Int(0)))
);
field_builder!(
    /// `real` column, defaults to `0`.
    FloatField,
    FieldKind::Float,
    Some(DefaultValue::Literal(Value::Float(0.0)))
);
field_builder!(
    /// `text` column, no default.
    TextField,
    FieldKind::Text,
    None
);
field_builder!(
    /// `datetime` column, no default.
    DatetimeField,
    FieldKind::Datetime,
    None
);

impl StringField {
    pub fn primary_key(mut self) -> Self {
        self.0.primary_key = true;
        self
    }

    /// Override the column type, e.g. `varchar(50)`.
    pub fn ddl(mut self, column_type: impl Into<String>) -> Self {
        self.0.column_type = column_type.into();
        self
    }
}

impl IntegerField {
    pub fn primary_key(mut self) -> Self {
        self.0.primary_key = true;
        self
    }
}

impl FloatField {
    pub fn primary_key(mut self) -> Self {
        self.0.primary_key = true;
        self
    }
}

impl DatetimeField {
    /// Default to the current time when inserted unset.
    pub fn default_now(self) -> Self {
        self.default_with(|| Value::Datetime(Utc::now()))
    }
}
