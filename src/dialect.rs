//! SQL dialects.
//!
//! A dialect is a set of pure rendering rules for one backend family:
//! placeholder syntax, identifier quoting and native type names. Dialects hold
//! no state, so one instance can be shared by every builder in the process.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::error::{QueryError, Result};
use std::sync::Arc;

/// Rendering rules for one backend family
pub trait Dialect: Send + Sync {
    /// Name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Placeholder for the argument at `position` (1-based)
    fn placeholder(&self, position: usize) -> String;

    fn quote_identifier(&self, name: &str) -> String;

    /// Native column type for a semantic type name such as `int64`.
    /// Unknown names map to the dialect's text type.
    fn native_type(&self, semantic_type: &str) -> String;

    /// Whether `INSERT ... RETURNING` is available
    fn supports_returning(&self) -> bool {
        true
    }
}

/// Look up a dialect by its configuration name
pub fn for_name(name: &str) -> Result<Arc<dyn Dialect>> {
    match name.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(Arc::new(Postgres)),
        "mysql" => Ok(Arc::new(MySql)),
        "sqlite" | "sqlite3" => Ok(Arc::new(Sqlite)),
        other => Err(QueryError::Render(format!("unknown dialect: {}", other))),
    }
}

/// Double every embedded `quote` and wrap the name in it
pub(crate) fn quote_with(name: &str, quote: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(quote);
    for c in name.chars() {
        if c == quote {
            quoted.push(quote);
        }
        quoted.push(c);
    }
    quoted.push(quote);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    #[test]
    fn test_for_name() {
        assert_eq!(for_name("postgres").unwrap().name(), "postgres");
        assert_eq!(for_name("PostgreSQL").unwrap().name(), "postgres");
        assert_eq!(for_name("mysql").unwrap().name(), "mysql");
        assert_eq!(for_name("sqlite3").unwrap().name(), "sqlite");
        assert!(matches!(for_name("oracle"), Err(QueryError::Render(_))));
    }

    #[test]
    fn test_quote_with_escapes() {
        assert_eq!(quote_with("users", '"'), "\"users\"");
        assert_eq!(quote_with("we\"ird", '"'), "\"we\"\"ird\"");
    }

    #[test]
    fn test_native_types_cover_every_data_type() {
        let types = [
            DataType::Boolean,
            DataType::Int32,
            DataType::Int64,
            DataType::Float64,
            DataType::Varchar,
            DataType::Bytes,
            DataType::Timestamp,
        ];
        for dialect in [for_name("postgres"), for_name("mysql"), for_name("sqlite")] {
            let dialect = dialect.unwrap();
            for data_type in types {
                assert!(!dialect.native_type(data_type.semantic_name()).is_empty());
            }
        }
    }
}
