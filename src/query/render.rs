//! SQL text generation.
//!
//! Rendering walks the WHERE tree depth-first, left to right, with a single
//! placeholder counter shared by the whole statement. Arguments are pushed in
//! the same order their placeholders appear, so the argument list lines up
//! with the text for both numbered (`$n`) and uniform (`?`) dialects.

use super::state::{Direction, QueryState};
use crate::condition::{Condition, ConditionGroup, Filter, Operand, Operator};
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::Value;

/// SQL text with its arguments in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Accumulates SQL text and arguments for one statement
struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    args: Vec<Value>,
}

impl<'d> SqlWriter<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(128),
            args: Vec::new(),
        }
    }

    /// Bind `value` and return its placeholder
    fn bind(&mut self, value: Value) -> String {
        self.args.push(value);
        self.dialect.placeholder(self.args.len())
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn quoted(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn finish(self) -> RenderedQuery {
        RenderedQuery {
            sql: self.sql,
            args: self.args,
        }
    }

    /// Render the top-level filters joined by AND. Writes nothing when every
    /// filter is empty.
    fn where_clause(&mut self, filters: &[Filter]) -> Result<()> {
        let mut first = true;
        for filter in filters.iter().filter(|f| !f.is_empty()) {
            self.push(if first { " WHERE " } else { " AND " });
            first = false;
            self.filter(filter)?;
        }
        Ok(())
    }

    fn filter(&mut self, filter: &Filter) -> Result<()> {
        match filter {
            Filter::Condition(condition) => self.condition(condition),
            Filter::Group(group) => self.group(group),
        }
    }

    fn group(&mut self, group: &ConditionGroup) -> Result<()> {
        let separator = format!(" {} ", group.operator.as_str());
        self.push("(");
        let mut first = true;
        for child in group.children.iter().filter(|c| !c.is_empty()) {
            if !first {
                self.push(&separator);
            }
            first = false;
            self.filter(child)?;
        }
        self.push(")");
        Ok(())
    }

    fn condition(&mut self, condition: &Condition) -> Result<()> {
        let column = condition.column.as_str();
        match condition.operator {
            Operator::IsNull | Operator::IsNotNull => {
                self.push(&format!("{} {}", column, condition.operator.as_str()));
            }

            Operator::In | Operator::NotIn => {
                let values = match &condition.operand {
                    Operand::List(values) => values.clone(),
                    Operand::Scalar(value) => vec![value.clone()],
                    other => return Err(malformed(condition, other)),
                };
                if values.is_empty() {
                    return Err(QueryError::Render(format!(
                        "{} on '{}' has an empty value list",
                        condition.operator.as_str(),
                        column
                    )));
                }
                let placeholders: Vec<String> = values.into_iter().map(|v| self.bind(v)).collect();
                self.push(&format!(
                    "{} {} ({})",
                    column,
                    condition.operator.as_str(),
                    placeholders.join(", ")
                ));
            }

            Operator::Between | Operator::NotBetween => {
                let (low, high) = match &condition.operand {
                    Operand::Range(low, high) => (low.clone(), high.clone()),
                    Operand::List(values) if values.len() == 2 => {
                        (values[0].clone(), values[1].clone())
                    }
                    other => {
                        return Err(QueryError::Construction {
                            column: column.to_string(),
                            reason: format!(
                                "{} expects exactly 2 values, got {}",
                                condition.operator.as_str(),
                                other.arg_count()
                            ),
                        })
                    }
                };
                let low = self.bind(low);
                let high = self.bind(high);
                self.push(&format!(
                    "{} {} {} AND {}",
                    column,
                    condition.operator.as_str(),
                    low,
                    high
                ));
            }

            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::Like
            | Operator::NotLike => {
                let value = match &condition.operand {
                    Operand::Scalar(value) => value.clone(),
                    other => return Err(malformed(condition, other)),
                };
                let placeholder = self.bind(value);
                self.push(&format!(
                    "{} {} {}",
                    column,
                    condition.operator.as_str(),
                    placeholder
                ));
            }
        }
        Ok(())
    }

    fn order_limit_offset(&mut self, state: &QueryState) {
        if !state.order_by.is_empty() {
            let parts: Vec<String> = state
                .order_by
                .iter()
                .map(|order| {
                    let direction = match order.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", self.quoted(&order.column), direction)
                })
                .collect();
            self.push(" ORDER BY ");
            self.push(&parts.join(", "));
        }
        if let Some(limit) = state.limit {
            self.push(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = state.offset {
            self.push(&format!(" OFFSET {}", offset));
        }
    }
}

fn malformed(condition: &Condition, operand: &Operand) -> QueryError {
    let shape = match operand {
        Operand::None => "no value",
        Operand::Scalar(_) => "a single value",
        Operand::List(_) => "a value list",
        Operand::Range(_, _) => "a range",
    };
    QueryError::Construction {
        column: condition.column.clone(),
        reason: format!("{} cannot take {}", condition.operator.as_str(), shape),
    }
}

/// `SELECT` over the accumulated state
pub fn render_select(state: &QueryState, dialect: &dyn Dialect) -> Result<RenderedQuery> {
    let mut writer = SqlWriter::new(dialect);
    writer.push("SELECT ");
    match &state.select {
        Some(columns) if !columns.is_empty() => {
            let quoted: Vec<String> = columns.iter().map(|c| writer.quoted(c)).collect();
            writer.push(&quoted.join(", "));
        }
        _ => writer.push("*"),
    }
    writer.push(" FROM ");
    let table = writer.quoted(&state.table);
    writer.push(&table);
    writer.where_clause(&state.filters)?;
    writer.order_limit_offset(state);
    Ok(writer.finish())
}

/// `SELECT COUNT(*)` with the same WHERE tree; ordering and paging are
/// ignored
pub fn render_count(state: &QueryState, dialect: &dyn Dialect) -> Result<RenderedQuery> {
    let mut writer = SqlWriter::new(dialect);
    writer.push("SELECT COUNT(*) FROM ");
    let table = writer.quoted(&state.table);
    writer.push(&table);
    writer.where_clause(&state.filters)?;
    Ok(writer.finish())
}

/// `INSERT`, optionally returning one column
pub fn render_insert(
    table: &str,
    values: Vec<(String, Value)>,
    returning: Option<&str>,
    dialect: &dyn Dialect,
) -> Result<RenderedQuery> {
    if values.is_empty() {
        return Err(QueryError::Render(format!(
            "nothing to insert into '{}'",
            table
        )));
    }
    if returning.is_some() && !dialect.supports_returning() {
        return Err(QueryError::Render(format!(
            "{} does not support INSERT ... RETURNING",
            dialect.name()
        )));
    }

    let mut writer = SqlWriter::new(dialect);
    let mut columns = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (column, value) in values {
        columns.push(writer.quoted(&column));
        placeholders.push(writer.bind(value));
    }
    let table = writer.quoted(table);
    writer.push(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    ));
    if let Some(column) = returning {
        let column = writer.quoted(column);
        writer.push(&format!(" RETURNING {}", column));
    }
    Ok(writer.finish())
}

/// `UPDATE ... SET ... WHERE key = ?`, key bound last
pub fn render_update(
    table: &str,
    values: Vec<(String, Value)>,
    key: (&str, Value),
    dialect: &dyn Dialect,
) -> Result<RenderedQuery> {
    if values.is_empty() {
        return Err(QueryError::Render(format!(
            "nothing to update in '{}'",
            table
        )));
    }

    let mut writer = SqlWriter::new(dialect);
    let mut assignments = Vec::with_capacity(values.len());
    for (column, value) in values {
        let placeholder = writer.bind(value);
        assignments.push(format!("{} = {}", writer.quoted(&column), placeholder));
    }
    let key_placeholder = writer.bind(key.1);
    let table = writer.quoted(table);
    let key_column = writer.quoted(key.0);
    writer.push(&format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        assignments.join(", "),
        key_column,
        key_placeholder
    ));
    Ok(writer.finish())
}

/// `DELETE ... WHERE key = ?`
pub fn render_delete(table: &str, key: (&str, Value), dialect: &dyn Dialect) -> RenderedQuery {
    let mut writer = SqlWriter::new(dialect);
    let placeholder = writer.bind(key.1);
    let table = writer.quoted(table);
    let key_column = writer.quoted(key.0);
    writer.push(&format!(
        "DELETE FROM {} WHERE {} = {}",
        table, key_column, placeholder
    ));
    writer.finish()
}
