//! Error types for structql

use thiserror::Error;

/// Result type alias for structql operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Errors raised while mapping records, building statements or materializing rows.
///
/// Everything except [`OrmError::Storage`] is a local validation error produced before
/// (or after) the executor is called; none of them are retried or recovered.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A field name used in an expression, column list or option is not part of the model
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// An expression node that cannot appear where it was used
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// INSERT built without any record
    #[error("insert requires at least one value")]
    NoValues,

    /// The row cursor was exhausted before a record could be filled
    #[error("no rows in result set")]
    NoRows,

    /// The row reports more columns than the model has fields
    #[error("too many columns returned: got {got}, model has {max} fields")]
    TooManyColumns { got: usize, max: usize },

    /// A field tag could not be parsed
    #[error("unknown tag format: {0:?}")]
    UnknownTagFormat(String),

    /// A cell could not be decoded into its field
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A valuer was asked to write into a value of a different type than its model
    #[error("model mismatch: model describes {expected}, target is {found}")]
    ModelMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Validation error
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage error reported by the executor, passed through untouched
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create an unknown column error
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn(name.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a no rows error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Wrap an executor error without reinterpreting it
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Check if this error came from the storage layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<tokio_postgres::Error> for OrmError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::storage(err)
    }
}
