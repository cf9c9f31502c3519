//! Column-to-field resolution and its cache.

use super::schema::{Embeddable, FieldDecl};
use crate::error::ScanError;
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Field positions to descend through, outermost first, ending at a column
pub type FieldPath = Vec<usize>;

struct Declaration {
    column: &'static str,
    path: FieldPath,
    label: String,
}

fn collect(fields: &[FieldDecl], parent: &[usize], prefix: &str, out: &mut Vec<Declaration>) {
    for (index, decl) in fields.iter().enumerate() {
        let mut path = parent.to_vec();
        path.push(index);
        match decl {
            FieldDecl::Column { field, column } => out.push(Declaration {
                column: *column,
                path,
                label: format!("{}{}", prefix, field),
            }),
            FieldDecl::Embedded { field, fields } => {
                let prefix = format!("{}{}.", prefix, field);
                collect(&fields(), &path, &prefix, out);
            }
            FieldDecl::Ignored { .. } => {}
        }
    }
}

/// Resolve every declared column of a record to exactly one field path.
///
/// The shallowest declaration of a column wins; two declarations at the same
/// depth are reported as ambiguous. The result keeps declaration order.
pub fn declared_columns(fields: &[FieldDecl]) -> Result<Vec<(String, FieldPath)>, ScanError> {
    let mut declarations = Vec::new();
    collect(fields, &[], "", &mut declarations);

    // column -> index of the shallowest declaration
    let mut winners: HashMap<&'static str, usize> = HashMap::new();
    for (i, decl) in declarations.iter().enumerate() {
        let depth = decl.path.len();
        match winners.get(decl.column).copied() {
            Some(current) if declarations[current].path.len() <= depth => {}
            _ => {
                winners.insert(decl.column, i);
            }
        }
    }

    for (i, decl) in declarations.iter().enumerate() {
        let winner = &declarations[winners[decl.column]];
        if winners[decl.column] != i && decl.path.len() == winner.path.len() {
            return Err(ScanError::AmbiguousColumn {
                column: decl.column.to_string(),
                first: winner.label.clone(),
                second: decl.label.clone(),
            });
        }
    }

    Ok(declarations
        .into_iter()
        .enumerate()
        .filter(|(i, decl)| winners.get(decl.column) == Some(i))
        .map(|(_, decl)| (decl.column.to_string(), decl.path))
        .collect())
}

/// Routing of one result-column list onto one record type
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    columns: Vec<String>,
    paths: Vec<Option<FieldPath>>,
}

impl ColumnPlan {
    /// Resolve each result column; columns no field declares get no path
    pub fn build(fields: &[FieldDecl], columns: &[String]) -> Result<Self, ScanError> {
        let declared: HashMap<String, FieldPath> = declared_columns(fields)?.into_iter().collect();
        let paths = columns
            .iter()
            .map(|column| declared.get(column).cloned())
            .collect();
        Ok(Self {
            columns: columns.to_vec(),
            paths,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Each result column paired with its field path, in result order
    pub fn routes(&self) -> impl Iterator<Item = (&str, Option<&FieldPath>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.paths.iter().map(Option::as_ref))
    }

    /// Result columns that will be discarded
    pub fn unrouted_columns(&self) -> impl Iterator<Item = &str> {
        self.routes()
            .filter(|(_, path)| path.is_none())
            .map(|(column, _)| column)
    }

    /// Routed columns that appear more than once in the result, each reported
    /// at its second and later occurrences
    pub fn duplicate_columns(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.routes()
            .filter(|(_, path)| path.is_some())
            .filter(move |(column, _)| !seen.insert(*column))
            .map(|(column, _)| column)
    }
}

type PlanKey = (TypeId, Vec<String>);

/// Concurrent cache of plans keyed by record type and result-column list
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: DashMap<PlanKey, Arc<ColumnPlan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the plan for `E` and `columns`, building it on first use
    pub fn get_or_build<E: Embeddable>(&self, columns: &[String]) -> Result<Arc<ColumnPlan>, ScanError> {
        let key = (TypeId::of::<E>(), columns.to_vec());
        if let Some(plan) = self.plans.get(&key) {
            return Ok(Arc::clone(plan.value()));
        }

        let plan = Arc::new(ColumnPlan::build(&E::fields(), columns)?);
        log::debug!(
            "built column plan for {} over [{}]",
            std::any::type_name::<E>(),
            columns.join(", ")
        );
        for column in plan.unrouted_columns() {
            log::warn!("column '{}' has no field on {} and will be discarded", column, std::any::type_name::<E>());
        }
        for column in plan.duplicate_columns() {
            log::warn!("column '{}' appears more than once; the last value is kept", column);
        }
        let plan = self.plans.entry(key).or_insert(plan);
        Ok(Arc::clone(plan.value()))
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn clear(&self) {
        self.plans.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Model;
    use anyhow::Result;

    #[derive(Debug, Default)]
    struct Audit {
        id: i64,
        actor: String,
    }

    crate::schema! {
        Audit {
            id: column("id"),
            actor: column("actor"),
        }
    }

    /// Declares `id` directly and again through both embedded records
    #[derive(Debug, Default)]
    struct Event {
        model: Model,
        audit: Audit,
        id: i64,
        kind: String,
    }

    crate::schema! {
        Event {
            model: embedded(Model),
            audit: embedded(Audit),
            id: column("id"),
            kind: column("kind"),
        }
    }

    /// Two embedded records declaring `id` at the same depth
    #[derive(Debug, Default)]
    struct Clash {
        model: Model,
        audit: Audit,
    }

    crate::schema! {
        Clash {
            model: embedded(Model),
            audit: embedded(Audit),
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_outermost_declaration_wins() -> Result<()> {
        let declared = declared_columns(&Event::fields())?;
        let id = declared.iter().find(|(c, _)| c == "id").map(|(_, p)| p.clone());
        assert_eq!(id, Some(vec![2]));
        let actor = declared.iter().find(|(c, _)| c == "actor").map(|(_, p)| p.clone());
        assert_eq!(actor, Some(vec![1, 1]));
        Ok(())
    }

    #[test]
    fn test_same_depth_duplicates_are_ambiguous() {
        let err = declared_columns(&Clash::fields()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'id' is declared by both 'model.id' and 'audit.id'"
        );
        assert!(ColumnPlan::build(&Clash::fields(), &columns(&["actor"])).is_err());
    }

    #[test]
    fn test_plan_routes_and_unrouted() -> Result<()> {
        let plan = ColumnPlan::build(&Event::fields(), &columns(&["kind", "bogus", "updated_at"]))?;
        let routes: Vec<_> = plan.routes().map(|(c, p)| (c.to_string(), p.cloned())).collect();
        assert_eq!(
            routes,
            vec![
                ("kind".to_string(), Some(vec![3])),
                ("bogus".to_string(), None),
                ("updated_at".to_string(), Some(vec![0, 2])),
            ]
        );
        assert_eq!(plan.unrouted_columns().collect::<Vec<_>>(), ["bogus"]);
        Ok(())
    }

    #[test]
    fn test_cache_reuses_plans_per_type_and_columns() -> Result<()> {
        let cache = PlanCache::new();
        let a = cache.get_or_build::<Event>(&columns(&["id", "kind"]))?;
        let b = cache.get_or_build::<Event>(&columns(&["id", "kind"]))?;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.get_or_build::<Event>(&columns(&["kind", "id"]))?;
        cache.get_or_build::<Audit>(&columns(&["id", "kind"]))?;
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }
}
