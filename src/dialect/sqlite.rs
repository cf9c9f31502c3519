//! SQLite dialect: uniform `?` placeholders, double-quoted identifiers and
//! the small set of storage classes SQLite actually distinguishes.

use super::{quote_with, Dialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn native_type(&self, semantic_type: &str) -> String {
        match semantic_type {
            // no native boolean
            "bool" | "int32" | "int64" => "INTEGER",
            "float32" | "float64" => "REAL",
            "bytes" => "BLOB",
            "timestamp" => "DATETIME",
            _ => "TEXT",
        }
        .to_string()
    }
}
