//! Type-safe SQL query builder and row materializer.
//!
//! Conditions are built from typed column handles, collected by an immutable
//! `QueryBuilder`, rendered for one SQL dialect and handed to an `Executor`.
//! Result rows are mapped onto records, embedded sub-records included, through
//! cached column plans.

pub mod condition;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod field;
pub mod logger;
pub mod optional;
pub mod query;
pub mod scan;
pub mod value;

pub use condition::{and, not, or, Condition, ConditionGroup, Filter};
pub use config::Config;
pub use db::Db;
pub use dialect::Dialect;
pub use error::{QueryError, Result, ScanError};
pub use executor::{Executor, QueryContext};
pub use field::{Column, OptionalColumn};
pub use logger::QueryLogger;
pub use optional::Optional;
pub use query::QueryBuilder;
pub use scan::{Embeddable, Model, Record};
pub use value::{SqlValue, Value};
