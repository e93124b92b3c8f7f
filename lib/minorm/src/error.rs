use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Duplicate primary key for field: {field} (model {model})")]
    DuplicatePrimaryKey { model: String, field: String },

    #[error("Primary key not found (model {model})")]
    MissingPrimaryKey { model: String },

    #[error("Duplicate field: {field} (model {model})")]
    DuplicateField { model: String, field: String },

    #[error("Duplicate column: {column} (model {model})")]
    DuplicateColumn { model: String, column: String },

    #[error("'{model}' object has no attribute '{field}'")]
    UnknownField { model: String, field: String },

    #[error("Invalid limit value: {0}")]
    InvalidLimit(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrmError {
    /// True for faults raised while a record type is being registered.
    pub fn is_definition_fault(&self) -> bool {
        matches!(
            self,
            OrmError::DuplicatePrimaryKey { .. }
                | OrmError::MissingPrimaryKey { .. }
                | OrmError::DuplicateField { .. }
                | OrmError::DuplicateColumn { .. }
        )
    }
}
