//! Immutable, record-typed query builder.

use super::render::{self, RenderedQuery};
use super::state::{Direction, OrderBy, QueryState};
use crate::condition::Filter;
use crate::db::Db;
use crate::error::{QueryError, Result, ScanError};
use crate::executor::QueryContext;
use crate::field::Field;
use crate::scan::Record;
use crate::value::{SqlValue, Value};
use std::marker::PhantomData;

/// A query over `R`'s table.
///
/// Every refining method takes `&self` and returns a new builder with its own
/// copy of the state, so a base builder can be shared and extended in many
/// directions without the branches observing each other. Nothing is rendered
/// or executed until `find`, `first` or `count`.
pub struct QueryBuilder<R> {
    db: Db,
    state: QueryState,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            state: self.state.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for QueryBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("state", &self.state)
            .finish()
    }
}

impl<R: Record> QueryBuilder<R> {
    pub(crate) fn new(db: Db) -> Self {
        Self {
            db,
            state: QueryState::new(R::table_name()),
            _record: PhantomData,
        }
    }

    fn derive(&self, change: impl FnOnce(&mut QueryState)) -> Self {
        let mut next = self.clone();
        change(&mut next.state);
        next
    }

    /// Add a condition or group; successive filters are joined with AND
    pub fn filter(&self, filter: impl Into<Filter>) -> Self {
        let filter = filter.into();
        self.derive(|state| state.filters.push(filter))
    }

    pub fn order_by_asc(&self, column: impl Field) -> Self {
        let order = OrderBy::new(column.column_name(), Direction::Asc);
        self.derive(|state| state.order_by.push(order))
    }

    pub fn order_by_desc(&self, column: impl Field) -> Self {
        let order = OrderBy::new(column.column_name(), Direction::Desc);
        self.derive(|state| state.order_by.push(order))
    }

    pub fn limit(&self, limit: u64) -> Self {
        self.derive(|state| state.limit = Some(limit))
    }

    pub fn offset(&self, offset: u64) -> Self {
        self.derive(|state| state.offset = Some(offset))
    }

    /// Restrict the selected columns. Columns no field of `R` declares are
    /// discarded while scanning unless strict column checking is on.
    pub fn select<I>(&self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Field,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.column_name().to_string())
            .collect();
        self.derive(|state| state.select = Some(columns))
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Render the SELECT this builder would run
    pub fn to_sql(&self) -> Result<RenderedQuery> {
        render::render_select(&self.state, self.db.dialect())
    }

    /// Render the COUNT this builder would run
    pub fn count_sql(&self) -> Result<RenderedQuery> {
        render::render_count(&self.state, self.db.dialect())
    }

    /// Every matching record, in result order
    pub fn find(&self, ctx: &QueryContext) -> Result<Vec<R>> {
        let query = self.to_sql()?;
        self.db.fetch_all(ctx, &query)
    }

    /// The first matching record. Zero rows is `QueryError::NotFound`.
    pub fn first(&self, ctx: &QueryContext) -> Result<R> {
        let query = self.limit(1).to_sql()?;
        self.db
            .fetch_all::<R>(ctx, &query)?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound {
                table: self.state.table.clone(),
            })
    }

    /// Number of matching rows, ignoring ordering and paging
    pub fn count(&self, ctx: &QueryContext) -> Result<i64> {
        let query = self.count_sql()?;
        let row = self
            .db
            .fetch_one_row(ctx, &query)?
            .ok_or_else(|| QueryError::Execution {
                sql: query.sql.clone(),
                args: query.args.clone(),
                source: anyhow::anyhow!("count returned no row"),
            })?;
        let value = row.values.into_iter().next().unwrap_or(Value::Null);
        let count = i64::from_value(value).map_err(|source| ScanError::TypeMismatch {
            column: "count".to_string(),
            source,
        })?;
        Ok(count)
    }
}
