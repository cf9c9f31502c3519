//! Scripted in-memory executor.
//!
//! `MemoryExecutor` records every statement it receives and answers from a
//! queue of prepared responses, in order. It lets code built on the query
//! layer be tested without a database. The context deadline of each call is
//! recorded, and a call made after its deadline fails without consuming a
//! response.

use super::{Executor, QueryContext, Row, RowCursor, VecCursor};
use crate::value::Value;
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

/// A statement as the executor received it
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
    /// Deadline of the context the statement was issued under
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone)]
enum Response {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Affected(u64),
    Error(String),
}

#[derive(Debug, Default)]
struct Inner {
    statements: Vec<Statement>,
    responses: VecDeque<Response>,
}

/// Executor that replays queued responses and records what it was asked
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    inner: Mutex<Inner>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set for the next query
    pub fn push_rows<C, S>(&self, columns: C, rows: Vec<Vec<Value>>)
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.inner
            .lock()
            .responses
            .push_back(Response::Rows { columns, rows });
    }

    /// Queue an affected-row count for the next statement
    pub fn push_affected(&self, count: u64) {
        self.inner.lock().responses.push_back(Response::Affected(count));
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, message: impl Into<String>) {
        self.inner
            .lock()
            .responses
            .push_back(Response::Error(message.into()));
    }

    /// Every statement received so far, oldest first
    pub fn statements(&self) -> Vec<Statement> {
        self.inner.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.inner.lock().statements.last().cloned()
    }

    /// Responses not yet consumed
    pub fn pending(&self) -> usize {
        self.inner.lock().responses.len()
    }

    fn next_response(&self, ctx: &QueryContext, sql: &str, args: &[Value]) -> Option<Response> {
        let mut inner = self.inner.lock();
        inner.statements.push(Statement {
            sql: sql.to_string(),
            args: args.to_vec(),
            deadline: ctx.deadline(),
        });
        match ctx.deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                Some(Response::Error("deadline exceeded".to_string()))
            }
            _ => inner.responses.pop_front(),
        }
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, ctx: &QueryContext, sql: &str, args: &[Value]) -> Result<u64> {
        match self.next_response(ctx, sql, args) {
            None => Ok(0),
            Some(Response::Affected(count)) => Ok(count),
            Some(Response::Error(message)) => bail!(message),
            Some(Response::Rows { .. }) => bail!("expected an affected-row count, got rows"),
        }
    }

    fn query_rows(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Box<dyn RowCursor + '_>> {
        match self.next_response(ctx, sql, args) {
            None => Ok(Box::new(VecCursor::default())),
            Some(Response::Rows { columns, rows }) => Ok(Box::new(VecCursor::new(columns, rows))),
            Some(Response::Error(message)) => bail!(message),
            Some(Response::Affected(_)) => bail!("expected rows, got an affected-row count"),
        }
    }

    fn query_one_row(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Option<Row>> {
        match self.next_response(ctx, sql, args) {
            None => Ok(None),
            Some(Response::Rows { columns, rows }) => {
                Ok(rows.into_iter().next().map(|values| Row::new(columns, values)))
            }
            Some(Response::Error(message)) => bail!(message),
            Some(Response::Affected(_)) => bail!("expected a row, got an affected-row count"),
        }
    }
}
