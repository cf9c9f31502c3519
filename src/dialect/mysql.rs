//! MySQL dialect: uniform `?` placeholders, backtick-quoted identifiers.

use super::{quote_with, Dialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`')
    }

    fn native_type(&self, semantic_type: &str) -> String {
        match semantic_type {
            "bool" => "BOOLEAN",
            "int32" => "INT",
            "int64" => "BIGINT",
            "float32" => "FLOAT",
            "float64" => "DOUBLE",
            "string" => "VARCHAR(255)",
            "bytes" => "BLOB",
            "timestamp" => "DATETIME",
            _ => "TEXT",
        }
        .to_string()
    }

    fn supports_returning(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_uniform() {
        assert_eq!(MySql.placeholder(1), "?");
        assert_eq!(MySql.placeholder(7), "?");
    }

    #[test]
    fn test_quote_and_types() {
        assert_eq!(MySql.quote_identifier("users"), "`users`");
        assert_eq!(MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(MySql.native_type("timestamp"), "DATETIME");
        assert!(!MySql.supports_returning());
    }
}
