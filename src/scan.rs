//! Mapping result rows onto records.
//!
//! Records describe their fields once through `Embeddable::fields`. From that
//! description a `ColumnPlan` is built per distinct result-column list: each
//! result column is resolved to a `FieldPath` (the positions to descend
//! through, embedded sub-records included) or discarded when no field claims
//! it. Plans are cached in a `PlanCache` and every row is then assigned
//! positionally through the plan.
//!
//! Name resolution rules:
//! - a column declared directly on a record shadows the same column declared
//!   inside an embedded sub-record, at any depth (outermost wins);
//! - two declarations of one column at the same depth are ambiguous and
//!   rejected when the plan is built, before any row is read;
//! - a result column that repeats (`SELECT id, id`) is assigned once per
//!   occurrence, so the last value wins. Strict materializers reject it.
//!   The rule does not apply to discarded columns.

pub mod plan;
pub mod schema;

pub use plan::{declared_columns, ColumnPlan, FieldPath, PlanCache};
pub use schema::{
    ColumnSlot, Embeddable, FieldAccess, FieldDecl, FieldMut, FieldRef, Model, Record,
};

use crate::error::ScanError;
use crate::value::Value;

/// Follow `path` down to a column field, for writing
pub fn resolve_mut<'a>(target: &'a mut dyn FieldAccess, path: &[usize]) -> Option<&'a mut dyn ColumnSlot> {
    match path {
        [] => None,
        [last] => match target.field_mut(*last)? {
            FieldMut::Column(slot) => Some(slot),
            FieldMut::Embedded(_) => None,
        },
        [first, rest @ ..] => match target.field_mut(*first)? {
            FieldMut::Embedded(inner) => resolve_mut(inner, rest),
            FieldMut::Column(_) => None,
        },
    }
}

/// Follow `path` down to a column field, for reading
pub fn resolve_ref<'a>(target: &'a dyn FieldAccess, path: &[usize]) -> Option<&'a dyn ColumnSlot> {
    match path {
        [] => None,
        [last] => match target.field_ref(*last)? {
            FieldRef::Column(slot) => Some(slot),
            FieldRef::Embedded(_) => None,
        },
        [first, rest @ ..] => match target.field_ref(*first)? {
            FieldRef::Embedded(inner) => resolve_ref(inner, rest),
            FieldRef::Column(_) => None,
        },
    }
}

/// Assigns rows to records through a prepared plan
pub struct Materializer<'p> {
    plan: &'p ColumnPlan,
    strict: bool,
}

impl<'p> Materializer<'p> {
    /// In strict mode a result column no field claims is an error instead of
    /// being discarded, and so is a routed column that repeats.
    pub fn new(plan: &'p ColumnPlan, strict: bool) -> Result<Self, ScanError> {
        if strict {
            if let Some(column) = plan.unrouted_columns().next() {
                return Err(ScanError::UnknownColumn(column.to_string()));
            }
            if let Some(column) = plan.duplicate_columns().next() {
                return Err(ScanError::DuplicateColumn(column.to_string()));
            }
        }
        Ok(Self { plan, strict })
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Scan one row into `target`, positionally
    pub fn scan_row(&self, target: &mut dyn FieldAccess, values: Vec<Value>) -> Result<(), ScanError> {
        let expected = self.plan.columns().len();
        if values.len() != expected {
            return Err(ScanError::ColumnCount {
                expected,
                actual: values.len(),
            });
        }

        for ((column, path), value) in self.plan.routes().zip(values) {
            let Some(path) = path else {
                continue;
            };
            let slot = resolve_mut(target, path).ok_or_else(|| ScanError::InvalidPath {
                column: column.to_string(),
                path: path.clone(),
            })?;
            slot.assign(value).map_err(|source| ScanError::TypeMismatch {
                column: column.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Build a fresh record from one row
    pub fn materialize<R: Embeddable>(&self, values: Vec<Value>) -> Result<R, ScanError> {
        let mut record = R::default();
        self.scan_row(&mut record, values)?;
        Ok(record)
    }
}

/// Every declared column of `record` with its current value, in declaration
/// order, after precedence has been applied.
pub fn column_values<R: Embeddable>(record: &R) -> Result<Vec<(String, Value)>, ScanError> {
    declared_columns(&R::fields())?
        .into_iter()
        .map(|(column, path)| {
            let slot = resolve_ref(record, &path).ok_or_else(|| ScanError::InvalidPath {
                column: column.clone(),
                path: path.clone(),
            })?;
            Ok((column, slot.current()))
        })
        .collect()
}
