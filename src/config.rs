//! Handle configuration.

use serde::{Deserialize, Serialize};

/// Settings for building a `Db` handle with `Db::from_config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dialect name: `postgres`, `mysql` or `sqlite`
    pub dialect: String,
    /// Reject result columns that no record field declares
    pub strict_columns: bool,
    /// Report statements through the default logger
    pub log_queries: bool,
    /// Include bound arguments in log lines
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            strict_columns: false,
            log_queries: true,
            verbose_logging: false,
        }
    }
}
