//! Error types for query construction, execution and materialization.

use crate::value::{ConversionError, Value};
use thiserror::Error;

/// Errors raised while mapping result rows onto records
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("column '{0}' does not map to any field")]
    UnknownColumn(String),

    #[error("column '{column}' is declared by both '{first}' and '{second}'")]
    AmbiguousColumn {
        column: String,
        first: String,
        second: String,
    },

    #[error("column '{0}' appears more than once in the result set")]
    DuplicateColumn(String),

    #[error("column '{column}': {source}")]
    TypeMismatch {
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("field path {path:?} for column '{column}' does not resolve to a column field")]
    InvalidPath { column: String, path: Vec<usize> },

    #[error("row has {actual} values but the result set has {expected} columns")]
    ColumnCount { expected: usize, actual: usize },
}

/// Errors surfaced by the query layer
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed operator arguments, detected when the query is rendered
    #[error("invalid condition on '{column}': {reason}")]
    Construction { column: String, reason: String },

    #[error("cannot render query: {0}")]
    Render(String),

    #[error("query failed: {sql}")]
    Execution {
        sql: String,
        args: Vec<Value>,
        #[source]
        source: anyhow::Error,
    },

    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("no rows found in '{table}'")]
    NotFound { table: String },

    #[error("{hook} rejected the record: {source}")]
    Validation {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("query cancelled before execution")]
    Cancelled,
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    #[test]
    fn test_error_display() {
        let err = QueryError::Construction {
            column: "age".to_string(),
            reason: "BETWEEN expects exactly 2 values, got 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid condition on 'age': BETWEEN expects exactly 2 values, got 3"
        );

        let err = QueryError::NotFound {
            table: "users".to_string(),
        };
        assert_eq!(err.to_string(), "no rows found in 'users'");
        assert!(err.is_not_found());

        let err = QueryError::from(ScanError::TypeMismatch {
            column: "age".to_string(),
            source: ConversionError {
                expected: DataType::Int32,
                found: "Varchar".to_string(),
            },
        });
        assert_eq!(
            err.to_string(),
            "scan failed: column 'age': cannot convert Varchar into Int32"
        );

        let err = ScanError::AmbiguousColumn {
            column: "id".to_string(),
            first: "audit.id".to_string(),
            second: "model.id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'id' is declared by both 'audit.id' and 'model.id'"
        );
    }

    #[test]
    fn test_execution_error_keeps_source() {
        let err = QueryError::Execution {
            sql: "SELECT 1".to_string(),
            args: vec![],
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(err.to_string(), "query failed: SELECT 1");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection reset"));
    }
}
