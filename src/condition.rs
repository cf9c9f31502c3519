//! WHERE-clause tree.
//!
//! Leaves are `Condition`s produced by typed columns (see `crate::field`);
//! inner nodes are `ConditionGroup`s built with `and` / `or`. The tree is pure
//! data: nothing is rendered or validated until a terminal query call.

use crate::value::Value;

/// Comparison operators available on a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// SQL keyword or symbol for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// The operator selecting exactly the rows this one rejects, under SQL
    /// three-valued logic.
    pub fn complement(&self) -> Operator {
        match self {
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
            Operator::Gt => Operator::Lte,
            Operator::Lte => Operator::Gt,
            Operator::Gte => Operator::Lt,
            Operator::Lt => Operator::Gte,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Between => Operator::NotBetween,
            Operator::NotBetween => Operator::Between,
            Operator::IsNull => Operator::IsNotNull,
            Operator::IsNotNull => Operator::IsNull,
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `IS NULL` / `IS NOT NULL`
    None,
    Scalar(Value),
    List(Vec<Value>),
    /// Inclusive `(low, high)`
    Range(Value, Value),
}

impl Operand {
    /// Number of bound arguments the operand contributes
    pub fn arg_count(&self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Scalar(_) => 1,
            Operand::List(values) => values.len(),
            Operand::Range(_, _) => 2,
        }
    }
}

/// A single comparison: the leaf of a WHERE tree
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub operand: Operand,
}

impl Condition {
    /// Build a condition directly. Typed columns are the usual way in; a
    /// mismatched operator/operand pair made here is reported at render time.
    pub fn new(column: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self {
            column: column.into(),
            operator,
            operand,
        }
    }
}

/// Boolean connective of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// A node of the WHERE tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Condition(Condition),
    Group(ConditionGroup),
}

impl Filter {
    /// True when the node renders to nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Condition(_) => false,
            Filter::Group(group) => group.is_empty(),
        }
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Filter::Condition(condition)
    }
}

impl From<ConditionGroup> for Filter {
    fn from(group: ConditionGroup) -> Self {
        Filter::Group(group)
    }
}

/// Conditions and nested groups joined by one logical operator
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    pub children: Vec<Filter>,
}

impl ConditionGroup {
    pub fn new<I>(operator: LogicalOperator, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Filter>,
    {
        Self {
            operator,
            children: children.into_iter().map(Into::into).collect(),
        }
    }

    /// A group is empty when none of its descendants is a condition
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(Filter::is_empty)
    }
}

/// Join children with AND
pub fn and<I>(children: I) -> ConditionGroup
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    ConditionGroup::new(LogicalOperator::And, children)
}

/// Join children with OR
pub fn or<I>(children: I) -> ConditionGroup
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    ConditionGroup::new(LogicalOperator::Or, children)
}

/// Invert a single leaf condition by swapping in its complement operator.
/// Groups are not accepted; no De Morgan rewriting happens here.
pub fn not(condition: Condition) -> Condition {
    Condition {
        operator: condition.operator.complement(),
        ..condition
    }
}
