//! PostgreSQL dialect: numbered `$n` placeholders, double-quoted identifiers.

use super::{quote_with, Dialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn native_type(&self, semantic_type: &str) -> String {
        match semantic_type {
            "bool" => "BOOLEAN",
            "int32" => "INTEGER",
            "int64" => "BIGINT",
            "float32" => "REAL",
            "float64" => "DOUBLE PRECISION",
            "string" => "VARCHAR(255)",
            "bytes" => "BYTEA",
            "timestamp" => "TIMESTAMP",
            _ => "TEXT",
        }
        .to_string()
    }
}
