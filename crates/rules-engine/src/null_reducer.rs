//! Null reducer: drops the parts of a condition that can only evaluate to
//! NULL once some relations are null-padded or some columns are known to
//! be NULL.

use crate::exprs::{conjuncts, prune};
use catalog::{NullabilityLookup, scope::relation_key};
use sql_syntax::ast::{
    ColumnRef, Expr, FunctionCall, Query,
    visitor::{ExprVisitor, outer_references, walk_expr},
};
use std::{collections::BTreeSet, sync::Arc};

/// What is known to be NULL while reducing a condition.
pub struct NullContext<'a> {
    /// Relations whose columns are all NULL (the null-padded side of an
    /// outer join).
    pub excluded: &'a BTreeSet<String>,
    /// Columns asserted to be NULL.
    pub known_null: &'a [ColumnRef],
    /// Columns whose nullness is decided by `known_null` alone, regardless
    /// of the relation they belong to.
    pub tracked: &'a [ColumnRef],
}

impl NullContext<'_> {
    fn is_tracked(&self, column: &ColumnRef, lookup: &dyn NullabilityLookup) -> bool {
        self.tracked.iter().any(|c| same_column(c, column, lookup))
    }

    fn is_known_null(&self, column: &ColumnRef, lookup: &dyn NullabilityLookup) -> bool {
        self.known_null.iter().any(|c| same_column(c, column, lookup))
    }

    fn is_null(&self, column: &ColumnRef, lookup: &dyn NullabilityLookup) -> bool {
        if self.is_tracked(column, lookup) {
            return self.is_known_null(column, lookup);
        }
        lookup
            .relation_of(column)
            .is_some_and(|relation| self.excluded.contains(&relation))
    }
}

/// Two references name the same column when the names match and they
/// belong to the same relation.
fn same_column(a: &ColumnRef, b: &ColumnRef, lookup: &dyn NullabilityLookup) -> bool {
    if !a.name.eq_ignore_ascii_case(&b.name) {
        return false;
    }
    let owner = |c: &ColumnRef| lookup.relation_of(c).or_else(|| c.relation().map(relation_key));
    owner(a) == owner(b)
}

/// Returns the reduced condition, or `None` if nothing meaningful is left.
pub fn reduce(
    expr: &Arc<Expr>,
    ctx: &NullContext<'_>,
    lookup: &dyn NullabilityLookup,
) -> Option<Arc<Expr>> {
    prune(expr, &|leaf| !survives(leaf, ctx, lookup))
}

/// Reduces a condition against the `col IS NULL` conjuncts it asserts
/// itself. The asserting conjuncts are always kept.
pub fn reduce_asserted_nulls(expr: &Arc<Expr>, lookup: &dyn NullabilityLookup) -> Arc<Expr> {
    let asserting: Vec<(Arc<Expr>, ColumnRef)> = conjuncts(expr)
        .into_iter()
        .filter_map(|conjunct| {
            let column = match conjunct.as_ref() {
                Expr::IsNull {
                    expr,
                    negated: false,
                } => expr.as_column().cloned(),
                _ => None,
            }?;
            Some((conjunct, column))
        })
        .collect();

    if asserting.is_empty() {
        return expr.clone();
    }

    let columns: Vec<ColumnRef> = asserting.iter().map(|(_, c)| c.clone()).collect();
    let excluded = BTreeSet::new();
    let ctx = NullContext {
        excluded: &excluded,
        known_null: &columns,
        tracked: &columns,
    };

    prune(expr, &|leaf| {
        !asserting.iter().any(|(node, _)| Arc::ptr_eq(node, leaf)) && !survives(leaf, &ctx, lookup)
    })
    .unwrap_or_else(|| expr.clone())
}

/// A leaf survives unless it reads a column that is NULL in `ctx`, either
/// directly or through a sub-select correlated on it. An IS [NOT] NULL
/// test on a column is only dropped when the column is tracked and known
/// NULL; COUNT is never NULL.
fn survives(leaf: &Expr, ctx: &NullContext<'_>, lookup: &dyn NullabilityLookup) -> bool {
    if let Expr::IsNull { expr, .. } = leaf {
        if let Some(column) = expr.as_column() {
            return !(ctx.is_tracked(column, lookup) && ctx.is_known_null(column, lookup));
        }
    }

    let mut finder = NullReadFinder {
        ctx,
        lookup,
        found: false,
    };
    walk_expr(&mut finder, leaf);
    !finder.found
}

struct NullReadFinder<'c, 'a> {
    ctx: &'c NullContext<'a>,
    lookup: &'c dyn NullabilityLookup,
    found: bool,
}

impl ExprVisitor for NullReadFinder<'_, '_> {
    fn visit_column(&mut self, column: &ColumnRef) {
        if self.ctx.is_null(column, self.lookup) {
            self.found = true;
        }
    }

    fn enter_function(&mut self, call: &FunctionCall) -> bool {
        !call.is_count()
    }

    fn visit_subquery(&mut self, subquery: &Arc<Query>) {
        if outer_references(subquery)
            .iter()
            .any(|column| self.ctx.is_null(column, self.lookup))
        {
            self.found = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Scope;
    use sql_syntax::{ast::Select, parse};

    fn select_of(sql: &str) -> Select {
        parse(sql).unwrap().as_select().unwrap().clone()
    }

    fn reduce_where(sql: &str, excluded: &[&str], known: &[ColumnRef], tracked: &[ColumnRef]) -> Option<String> {
        let select = select_of(sql);
        let scope = Scope::new(&select, None, None);
        let excluded: BTreeSet<String> = excluded.iter().map(|s| s.to_string()).collect();
        let ctx = NullContext {
            excluded: &excluded,
            known_null: known,
            tracked,
        };
        reduce(select.selection.as_ref().unwrap(), &ctx, &scope).map(|e| e.to_string())
    }

    #[test]
    fn test_excluded_relation_drops_its_predicates() {
        assert_eq!(
            reduce_where(
                "SELECT * FROM a, b WHERE a.x = 1 AND (b.y = 2 OR a.z > 3)",
                &["b"],
                &[],
                &[]
            )
            .as_deref(),
            Some("a.x = 1 AND a.z > 3")
        );
    }

    #[test]
    fn test_everything_dropped() {
        assert_eq!(
            reduce_where("SELECT * FROM a, b WHERE b.y = 2 OR NOT b.z = 1", &["b"], &[], &[]),
            None
        );
    }

    #[test]
    fn test_tracked_columns_follow_known_nulls() {
        let id = ColumnRef::qualified("b", "id");
        let tracked = vec![id.clone()];

        // tracked but not known NULL: kept even though b is excluded
        assert_eq!(
            reduce_where("SELECT * FROM a, b WHERE b.id = 1 AND b.v = 2", &["b"], &[], &tracked).as_deref(),
            Some("b.id = 1")
        );
        // tracked and known NULL: dropped even though b is not excluded
        assert_eq!(
            reduce_where("SELECT * FROM a, b WHERE b.id = 1 AND a.v = 2", &[], &[id], &tracked).as_deref(),
            Some("a.v = 2")
        );
    }

    #[test]
    fn test_null_tests_are_kept_unless_known() {
        let id = ColumnRef::qualified("b", "id");
        assert_eq!(
            reduce_where("SELECT * FROM a, b WHERE b.v IS NULL", &["b"], &[], &[]).as_deref(),
            Some("b.v IS NULL")
        );
        assert_eq!(
            reduce_where(
                "SELECT * FROM a, b WHERE b.id IS NOT NULL AND a.v = 1",
                &[],
                &[id.clone()],
                &[id]
            )
            .as_deref(),
            Some("a.v = 1")
        );
    }

    #[test]
    fn test_count_is_never_null() {
        assert_eq!(
            reduce_where("SELECT * FROM a, b WHERE COUNT(b.v) > 1 AND SUM(b.v) > 2", &["b"], &[], &[])
                .as_deref(),
            Some("COUNT(b.v) > 1")
        );
    }

    #[test]
    fn test_subquery_correlated_on_padded_relation_is_dropped() {
        assert_eq!(
            reduce_where(
                "SELECT * FROM a, b WHERE a.v = 1 AND EXISTS (SELECT 1 FROM c WHERE c.k = b.k)",
                &["b"],
                &[],
                &[]
            )
            .as_deref(),
            Some("a.v = 1")
        );
        assert_eq!(
            reduce_where(
                "SELECT * FROM a, b WHERE a.v IN (SELECT c.v FROM c WHERE c.k = a.k)",
                &["b"],
                &[],
                &[]
            )
            .as_deref(),
            Some("a.v IN (SELECT c.v FROM c WHERE c.k = a.k)")
        );
    }

    #[test]
    fn test_subquery_correlated_on_known_null_column_is_dropped() {
        let select = select_of("SELECT * FROM t WHERE t.a IS NULL AND EXISTS (SELECT 1 FROM u WHERE u.a = t.a)");
        let scope = Scope::new(&select, None, None);
        let reduced = reduce_asserted_nulls(select.selection.as_ref().unwrap(), &scope);
        assert_eq!(reduced.to_string(), "t.a IS NULL");
    }

    #[test]
    fn test_asserted_nulls_reduce_the_rest() {
        let select = select_of("SELECT * FROM t WHERE year IS NULL AND (year > 5 OR title = 'x')");
        let scope = Scope::new(&select, None, None);
        let reduced = reduce_asserted_nulls(select.selection.as_ref().unwrap(), &scope);
        assert_eq!(reduced.to_string(), "year IS NULL AND title = 'x'");
    }
}
