//! The execution seam.
//!
//! The query layer never talks to a backend directly. It renders SQL text plus
//! an ordered argument list and hands both to an `Executor`, which owns the
//! connection, transaction and driver concerns. Rows come back through a
//! `RowCursor` and are consumed strictly in order.

use crate::value::Value;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod memory;

pub use memory::MemoryExecutor;

/// Trait for backends that run rendered SQL
pub trait Executor: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected row count
    fn execute(&self, ctx: &QueryContext, sql: &str, args: &[Value]) -> Result<u64>;

    /// Run a query and return a cursor over its rows
    fn query_rows(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Box<dyn RowCursor + '_>>;

    /// Run a query expected to produce at most one row
    fn query_one_row(&self, ctx: &QueryContext, sql: &str, args: &[Value])
        -> Result<Option<Row>>;
}

/// Sequential access to a result set
pub trait RowCursor {
    /// Result column names, in positional order
    fn columns(&self) -> &[String];

    /// Get the next row's values. Returns None when the set is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// A single result row with its column names
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of the named column, if present
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }
}

/// Cursor over rows already held in memory
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl VecCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl RowCursor for VecCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }
}

/// Caller-supplied cancellation and deadline token.
///
/// The query layer forwards it to every executor call and refuses to start a
/// call once it has been cancelled; enforcing the deadline is the executor's
/// job.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl QueryContext {
    /// A context with no deadline that is never cancelled unless asked to
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Int64(1), Value::from("alice")],
        );
        assert_eq!(row.get("name"), Some(&Value::from("alice")));
        assert_eq!(row.get("email"), None);
    }

    #[test]
    fn test_vec_cursor() -> Result<()> {
        let mut cursor = VecCursor::new(
            vec!["id".to_string()],
            vec![vec![Value::Int32(1)], vec![Value::Int32(2)]],
        );
        assert_eq!(cursor.columns(), ["id".to_string()]);
        assert_eq!(cursor.next_row()?, Some(vec![Value::Int32(1)]));
        assert_eq!(cursor.next_row()?, Some(vec![Value::Int32(2)]));
        assert_eq!(cursor.next_row()?, None);
        Ok(())
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let ctx = QueryContext::with_timeout(Duration::from_secs(5));
        let clone = ctx.clone();
        assert!(ctx.deadline().is_some());
        assert!(!clone.is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
        assert!(QueryContext::background().deadline().is_none());
    }
}
