//! Accumulated query state.

use crate::condition::Filter;

/// Sort direction of one ORDER BY item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Everything a builder has collected. Each builder owns its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub table: String,
    /// Top-level filters, joined with AND
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Explicit column list; `None` selects `*`
    pub select: Option<Vec<String>>,
}

impl QueryState {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            select: None,
        }
    }
}
