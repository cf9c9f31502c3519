//! Typed column handles.
//!
//! A `Column<T>` is bound to one storage column and only accepts operands of
//! type `T`. Which comparison methods exist depends on the capability traits
//! `T` implements: every `Comparable` type gets equality and membership,
//! `Ordered` types add range comparisons and `Textual` types add pattern
//! matching. Comparing a text column against a number, or calling `gt` on a
//! boolean column, does not compile.
//!
//! Handles are `const`-constructible, so a record's columns are usually
//! declared once as associated constants:
//!
//! ```
//! use vibeorm::field::{Column, OptionalColumn};
//!
//! struct UserColumns;
//!
//! impl UserColumns {
//!     const AGE: Column<i32> = Column::new("age");
//!     const NICKNAME: OptionalColumn<String> = OptionalColumn::new("nickname");
//! }
//!
//! let adult = UserColumns::AGE.gte(18);
//! let named = UserColumns::NICKNAME.like("a%");
//! assert_eq!(adult.column, "age");
//! assert_eq!(named.column, "nickname");
//! ```

use crate::condition::{Condition, Operand, Operator};
use crate::value::SqlValue;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::marker::PhantomData;

/// Types that support `=`, `!=`, `IN` and null tests
pub trait Comparable: SqlValue {}

/// Types with a total order: numerics and timestamps
pub trait Ordered: Comparable {}

/// Types that support `LIKE`
pub trait Textual: Comparable {}

impl Comparable for bool {}
impl Comparable for i32 {}
impl Comparable for i64 {}
impl Comparable for f64 {}
impl Comparable for String {}
impl Comparable for Bytes {}
impl Comparable for DateTime<Utc> {}

impl Ordered for i32 {}
impl Ordered for i64 {}
impl Ordered for f64 {}
impl Ordered for DateTime<Utc> {}

impl Textual for String {}

/// Anything that names a column
pub trait Field {
    fn column_name(&self) -> &str;
}

impl Field for str {
    fn column_name(&self) -> &str {
        self
    }
}

impl<F: Field + ?Sized> Field for &F {
    fn column_name(&self) -> &str {
        (**self).column_name()
    }
}

impl Field for String {
    fn column_name(&self) -> &str {
        self.as_str()
    }
}

fn scalar<T: SqlValue>(column: &str, operator: Operator, value: T) -> Condition {
    Condition::new(column, operator, Operand::Scalar(value.to_value()))
}

fn list<T, I>(column: &str, operator: Operator, values: I) -> Condition
where
    T: SqlValue,
    I: IntoIterator,
    I::Item: Into<T>,
{
    let values = values.into_iter().map(|v| v.into().to_value()).collect();
    Condition::new(column, operator, Operand::List(values))
}

fn range<T: SqlValue>(column: &str, operator: Operator, low: T, high: T) -> Condition {
    Condition::new(
        column,
        operator,
        Operand::Range(low.to_value(), high.to_value()),
    )
}

fn nullness(column: &str, operator: Operator) -> Condition {
    Condition::new(column, operator, Operand::None)
}

/// Handle for a non-nullable column of type `T`
pub struct Column<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

/// Handle for a nullable column holding `Optional<T>`. Comparisons take plain
/// `T` values; absence is tested with `is_null` / `is_not_null`.
pub struct OptionalColumn<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

macro_rules! column_handle {
    ($handle:ident) => {
        impl<T> $handle<T> {
            pub const fn new(name: &'static str) -> Self {
                Self {
                    name,
                    _type: PhantomData,
                }
            }

            pub const fn name(&self) -> &'static str {
                self.name
            }
        }

        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($handle)).field(&self.name).finish()
            }
        }

        impl<T> Field for $handle<T> {
            fn column_name(&self) -> &str {
                self.name
            }
        }

        impl<T: Comparable> $handle<T> {
            pub fn eq(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Eq, value.into())
            }

            pub fn ne(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Ne, value.into())
            }

            /// `column IN (...)`, values kept in the given order
            pub fn in_<I>(&self, values: I) -> Condition
            where
                I: IntoIterator,
                I::Item: Into<T>,
            {
                list::<T, I>(self.name, Operator::In, values)
            }

            pub fn not_in<I>(&self, values: I) -> Condition
            where
                I: IntoIterator,
                I::Item: Into<T>,
            {
                list::<T, I>(self.name, Operator::NotIn, values)
            }

            pub fn is_null(&self) -> Condition {
                nullness(self.name, Operator::IsNull)
            }

            pub fn is_not_null(&self) -> Condition {
                nullness(self.name, Operator::IsNotNull)
            }
        }

        impl<T: Ordered> $handle<T> {
            pub fn gt(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Gt, value.into())
            }

            pub fn gte(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Gte, value.into())
            }

            pub fn lt(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Lt, value.into())
            }

            pub fn lte(&self, value: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Lte, value.into())
            }

            /// Inclusive range, `low` first
            pub fn between(&self, low: impl Into<T>, high: impl Into<T>) -> Condition {
                range(self.name, Operator::Between, low.into(), high.into())
            }
        }

        impl<T: Textual> $handle<T> {
            pub fn like(&self, pattern: impl Into<T>) -> Condition {
                scalar(self.name, Operator::Like, pattern.into())
            }

            pub fn not_like(&self, pattern: impl Into<T>) -> Condition {
                scalar(self.name, Operator::NotLike, pattern.into())
            }
        }
    };
}

column_handle!(Column);
column_handle!(OptionalColumn);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use chrono::TimeZone;

    const AGE: Column<i32> = Column::new("age");
    const NAME: Column<String> = Column::new("name");
    const ACTIVE: Column<bool> = Column::new("is_active");
    const CREATED_AT: Column<DateTime<Utc>> = Column::new("created_at");
    const EMAIL: OptionalColumn<String> = OptionalColumn::new("email");
    const SCORE: OptionalColumn<i64> = OptionalColumn::new("score");

    #[test]
    fn test_equality_conditions() {
        let cond = AGE.eq(18);
        assert_eq!(cond.column, "age");
        assert_eq!(cond.operator, Operator::Eq);
        assert_eq!(cond.operand, Operand::Scalar(Value::Int32(18)));

        let cond = ACTIVE.ne(false);
        assert_eq!(cond.operator, Operator::Ne);
        assert_eq!(cond.operand, Operand::Scalar(Value::Boolean(false)));

        let cond = NAME.eq("alice");
        assert_eq!(cond.operand, Operand::Scalar(Value::from("alice")));
    }

    #[test]
    fn test_membership_preserves_order() {
        let cond = AGE.in_([3, 1, 2]);
        assert_eq!(cond.operator, Operator::In);
        assert_eq!(
            cond.operand,
            Operand::List(vec![Value::Int32(3), Value::Int32(1), Value::Int32(2)])
        );

        let cond = NAME.not_in(["a", "b"]);
        assert_eq!(cond.operator, Operator::NotIn);
        assert_eq!(cond.operand.arg_count(), 2);
    }

    #[test]
    fn test_ordering_conditions() {
        assert_eq!(AGE.gt(1).operator, Operator::Gt);
        assert_eq!(AGE.gte(1).operator, Operator::Gte);
        assert_eq!(AGE.lt(1).operator, Operator::Lt);
        assert_eq!(AGE.lte(1).operator, Operator::Lte);

        let cond = AGE.between(10, 20);
        assert_eq!(cond.operator, Operator::Between);
        assert_eq!(
            cond.operand,
            Operand::Range(Value::Int32(10), Value::Int32(20))
        );

        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let cond = CREATED_AT.gte(since);
        assert_eq!(cond.operand, Operand::Scalar(Value::Timestamp(since)));
    }

    #[test]
    fn test_text_conditions() {
        let cond = NAME.like("a%");
        assert_eq!(cond.operator, Operator::Like);
        assert_eq!(NAME.not_like("%z").operator, Operator::NotLike);
    }

    #[test]
    fn test_null_tests_carry_no_operand() {
        assert_eq!(AGE.is_null().operand, Operand::None);
        assert_eq!(EMAIL.is_not_null().operator, Operator::IsNotNull);
        assert_eq!(EMAIL.is_null().operand, Operand::None);
    }

    #[test]
    fn test_optional_columns_take_plain_values() {
        let cond = EMAIL.eq("a@example.com");
        assert_eq!(cond.column, "email");
        assert_eq!(cond.operand, Operand::Scalar(Value::from("a@example.com")));

        let cond = SCORE.between(1i64, 5i64);
        assert_eq!(cond.operand, Operand::Range(Value::Int64(1), Value::Int64(5)));
        assert_eq!(EMAIL.like("%@example.com").operator, Operator::Like);
    }

    #[test]
    fn test_handles_are_copy_and_named() {
        let copy = AGE;
        assert_eq!(copy.name(), "age");
        assert_eq!(AGE.column_name(), "age");
        assert_eq!(format!("{:?}", EMAIL), "OptionalColumn(\"email\")");
    }
}
