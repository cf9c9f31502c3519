//! Database handle.
//!
//! `Db` ties together the collaborators one application configures once: the
//! executor, the dialect, the query logger and the plan cache. It is cheap to
//! clone and every builder it hands out shares the same collaborators.

use crate::config::Config;
use crate::dialect::{self, Dialect};
use crate::error::{QueryError, Result, ScanError};
use crate::executor::{Executor, QueryContext, Row};
use crate::logger::{DefaultLogger, NoOpLogger, QueryLogger};
use crate::query::render::{self, RenderedQuery};
use crate::query::QueryBuilder;
use crate::scan::{self, declared_columns, FieldPath, Materializer, PlanCache, Record};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

struct Inner {
    executor: Arc<dyn Executor>,
    dialect: Arc<dyn Dialect>,
    logger: Arc<dyn QueryLogger>,
    plans: Arc<PlanCache>,
    strict_columns: bool,
}

/// Shared entry point for queries and record writes
#[derive(Clone)]
pub struct Db {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.inner.dialect.name())
            .field("strict_columns", &self.inner.strict_columns)
            .field("cached_plans", &self.inner.plans.len())
            .finish()
    }
}

impl Db {
    /// Create a handle with the default logger and lenient column scanning
    pub fn new(executor: Arc<dyn Executor>, dialect: Arc<dyn Dialect>) -> Self {
        Self::assemble(
            executor,
            dialect,
            Arc::new(DefaultLogger::default()),
            Arc::new(PlanCache::new()),
            false,
        )
    }

    /// Create a handle from configuration
    pub fn from_config(executor: Arc<dyn Executor>, config: &Config) -> Result<Self> {
        let dialect = dialect::for_name(&config.dialect)?;
        let logger: Arc<dyn QueryLogger> = if config.log_queries {
            Arc::new(DefaultLogger::new(config.verbose_logging))
        } else {
            Arc::new(NoOpLogger)
        };
        log::debug!(
            "opening handle: dialect={}, strict_columns={}",
            dialect.name(),
            config.strict_columns
        );
        Ok(Self::assemble(
            executor,
            dialect,
            logger,
            Arc::new(PlanCache::new()),
            config.strict_columns,
        ))
    }

    fn assemble(
        executor: Arc<dyn Executor>,
        dialect: Arc<dyn Dialect>,
        logger: Arc<dyn QueryLogger>,
        plans: Arc<PlanCache>,
        strict_columns: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                executor,
                dialect,
                logger,
                plans,
                strict_columns,
            }),
        }
    }

    /// A new handle with `logger` replacing the current one. Cached plans
    /// are shared with this handle.
    pub fn with_logger(&self, logger: Arc<dyn QueryLogger>) -> Self {
        Self::assemble(
            Arc::clone(&self.inner.executor),
            Arc::clone(&self.inner.dialect),
            logger,
            Arc::clone(&self.inner.plans),
            self.inner.strict_columns,
        )
    }

    /// A new handle that rejects result columns no field claims. Cached plans
    /// are shared with this handle.
    pub fn with_strict_columns(&self, strict: bool) -> Self {
        Self::assemble(
            Arc::clone(&self.inner.executor),
            Arc::clone(&self.inner.dialect),
            Arc::clone(&self.inner.logger),
            Arc::clone(&self.inner.plans),
            strict,
        )
    }

    pub fn executor(&self) -> &dyn Executor {
        self.inner.executor.as_ref()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect.as_ref()
    }

    pub fn strict_columns(&self) -> bool {
        self.inner.strict_columns
    }

    pub fn plans(&self) -> &PlanCache {
        &self.inner.plans
    }

    /// Start a query over `R`'s table
    pub fn table<R: Record>(&self) -> QueryBuilder<R> {
        QueryBuilder::new(self.clone())
    }

    /// Insert `record` and store the generated primary key back into it.
    ///
    /// The record is only touched by `before_create` until the insert
    /// succeeds; timestamps and the key are written back afterwards.
    pub fn create<R: Record>(&self, ctx: &QueryContext, record: &mut R) -> Result<()> {
        if !self.dialect().supports_returning() {
            return Err(QueryError::Render(format!(
                "{} does not support INSERT ... RETURNING",
                self.dialect().name()
            )));
        }
        let pk = R::primary_key();
        let key_path = key_path::<R>()?;

        record
            .before_create()
            .map_err(|source| QueryError::Validation {
                hook: "before_create",
                source,
            })?;

        let now = Utc::now();
        let mut values: Vec<(String, Value)> = scan::column_values(record)?
            .into_iter()
            .filter(|(column, _)| column != pk)
            .collect();
        stamp_values(&mut values, now, true);
        let query = render::render_insert(&R::table_name(), values, Some(pk), self.dialect())?;

        let row = self
            .run(ctx, &query, |executor| {
                executor.query_one_row(ctx, &query.sql, &query.args)
            })?
            .ok_or_else(|| QueryError::Execution {
                sql: query.sql.clone(),
                args: query.args.clone(),
                source: anyhow::anyhow!("insert returned no row"),
            })?;

        let key = row
            .get(pk)
            .or_else(|| row.values.first())
            .cloned()
            .unwrap_or(Value::Null);
        let slot = scan::resolve_mut(record, &key_path).ok_or_else(|| ScanError::InvalidPath {
            column: pk.to_string(),
            path: key_path.clone(),
        })?;
        slot.assign(key).map_err(|source| ScanError::TypeMismatch {
            column: pk.to_string(),
            source,
        })?;
        stamp(record, "created_at", now, true);
        stamp(record, "updated_at", now, false);
        Ok(())
    }

    /// Write every non-key column of `record` to its row, then refresh its
    /// `updated_at`
    pub fn update<R: Record>(&self, ctx: &QueryContext, record: &mut R) -> Result<()> {
        let pk = R::primary_key();
        let key = key_value(record)?;

        let now = Utc::now();
        let mut values: Vec<(String, Value)> = scan::column_values(record)?
            .into_iter()
            .filter(|(column, _)| column != pk)
            .collect();
        stamp_values(&mut values, now, false);
        let table = R::table_name();
        let query = render::render_update(&table, values, (pk, key), self.dialect())?;

        let affected = self.run(ctx, &query, |executor| {
            executor.execute(ctx, &query.sql, &query.args)
        })?;
        if affected == 0 {
            return Err(QueryError::NotFound { table });
        }
        stamp(record, "updated_at", now, false);
        Ok(())
    }

    /// Delete `record`'s row
    pub fn delete<R: Record>(&self, ctx: &QueryContext, record: &R) -> Result<()> {
        let key = key_value(record)?;
        let table = R::table_name();
        let query = render::render_delete(&table, (R::primary_key(), key), self.dialect());

        let affected = self.run(ctx, &query, |executor| {
            executor.execute(ctx, &query.sql, &query.args)
        })?;
        if affected == 0 {
            return Err(QueryError::NotFound { table });
        }
        Ok(())
    }

    /// Run a rendered query and materialize every row as `R`
    pub(crate) fn fetch_all<R: Record>(&self, ctx: &QueryContext, query: &RenderedQuery) -> Result<Vec<R>> {
        let (columns, rows) = self.run(ctx, query, |executor| {
            let mut cursor = executor.query_rows(ctx, &query.sql, &query.args)?;
            let columns = cursor.columns().to_vec();
            let mut rows = Vec::new();
            while let Some(row) = cursor.next_row()? {
                rows.push(row);
            }
            Ok((columns, rows))
        })?;

        let plan = self.inner.plans.get_or_build::<R>(&columns)?;
        let materializer = Materializer::new(&plan, self.inner.strict_columns)?;
        let mut records = Vec::with_capacity(rows.len());
        for values in rows {
            let mut record: R = materializer.materialize(values)?;
            record.after_find().map_err(|source| QueryError::Validation {
                hook: "after_find",
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    pub(crate) fn fetch_one_row(&self, ctx: &QueryContext, query: &RenderedQuery) -> Result<Option<Row>> {
        self.run(ctx, query, |executor| {
            executor.query_one_row(ctx, &query.sql, &query.args)
        })
    }

    /// Issue one executor call for `query`, reporting it to the logger exactly
    /// once. Executor failures are wrapped with the SQL and arguments.
    fn run<T>(
        &self,
        ctx: &QueryContext,
        query: &RenderedQuery,
        call: impl FnOnce(&dyn Executor) -> anyhow::Result<T>,
    ) -> Result<T> {
        if ctx.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        log::debug!("{}", query.sql);

        let started = Instant::now();
        match call(self.inner.executor.as_ref()) {
            Ok(value) => {
                let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
                self.inner.logger.log_query(&query.sql, &query.args, elapsed);
                Ok(value)
            }
            Err(source) => {
                self.inner.logger.log_error(&query.sql, &query.args, &*source);
                Err(QueryError::Execution {
                    sql: query.sql.clone(),
                    args: query.args.clone(),
                    source,
                })
            }
        }
    }
}

fn key_path<R: Record>() -> Result<FieldPath> {
    let pk = R::primary_key();
    declared_columns(&R::fields())?
        .into_iter()
        .find(|(column, _)| column == pk)
        .map(|(_, path)| path)
        .ok_or_else(|| {
            QueryError::Render(format!(
                "'{}' declares no primary key column '{}'",
                R::table_name(),
                pk
            ))
        })
}

/// Current primary key, rejecting unset keys
fn key_value<R: Record>(record: &R) -> Result<Value> {
    let pk = R::primary_key();
    let path = key_path::<R>()?;
    let slot = scan::resolve_ref(record, &path).ok_or_else(|| ScanError::InvalidPath {
        column: pk.to_string(),
        path: path.clone(),
    })?;
    let key = slot.current();
    let unset = match &key {
        Value::Null => true,
        Value::Int32(0) | Value::Int64(0) => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if unset {
        return Err(QueryError::Construction {
            column: pk.to_string(),
            reason: "primary key is not set".to_string(),
        });
    }
    Ok(key)
}

/// Replace the timestamp values about to be written: `updated_at` always,
/// `created_at` only while `creating` and still at the epoch.
fn stamp_values(values: &mut [(String, Value)], now: DateTime<Utc>, creating: bool) {
    for (column, value) in values.iter_mut() {
        let Value::Timestamp(current) = value else {
            continue;
        };
        let refresh = match column.as_str() {
            "updated_at" => true,
            "created_at" => creating && *current == DateTime::<Utc>::default(),
            _ => false,
        };
        if refresh {
            *value = Value::Timestamp(now);
        }
    }
}

/// Set a declared timestamp column to `now`. With `only_if_unset` an existing
/// non-epoch value is kept.
fn stamp<R: Record>(record: &mut R, column: &str, now: DateTime<Utc>, only_if_unset: bool) {
    let Ok(declared) = declared_columns(&R::fields()) else {
        return;
    };
    let Some((_, path)) = declared.into_iter().find(|(c, _)| c == column) else {
        return;
    };
    let Some(slot) = scan::resolve_mut(record, &path) else {
        return;
    };
    match slot.current() {
        Value::Timestamp(current) if only_if_unset && current != DateTime::<Utc>::default() => {}
        Value::Timestamp(_) => {
            // Same type as the slot, cannot fail
            let _ = slot.assign(Value::Timestamp(now));
        }
        _ => {}
    }
}
