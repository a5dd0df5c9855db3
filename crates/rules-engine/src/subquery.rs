//! Sub-query rules.
//!
//! Derived tables are covered as queries of their own and their rules
//! stand alone. A sub-select used by a WHERE or HAVING predicate is
//! covered in the scope of its parent, and every variant is spliced back
//! as `EXISTS (variant)` in place of the predicate.

use crate::{
    exprs::{leaves, without},
    orchestrator::{Coverage, Generator},
    rule_set::RuleSet,
};
use catalog::{NullabilityLookup, Scope};
use sql_syntax::ast::{
    ColumnRef, ComparisonOp, Expr, Query, Select, SelectItem, TableFactor,
    visitor::{aggregates_of, subqueries_of},
};
use std::sync::Arc;
use tracing::debug;

impl Generator<'_> {
    pub(crate) fn cover_subqueries(
        &self,
        query: &Query,
        sanitized: &Select,
        matched: &Select,
        scope: &Scope<'_>,
        depth: usize,
        coverage: &mut Coverage,
    ) {
        let mut derived = Vec::new();
        for factor in sanitized.factors() {
            derived_tables(factor, &mut derived);
        }
        for subquery in derived {
            // Derived tables cannot see the enclosing query
            let inner = self.cover_query(&subquery, None, depth + 1);
            coverage.standalone.extend(inner.into_rules());
        }

        if let Some(selection) = &matched.selection {
            let spliced = self.splice(selection, scope, depth, &mut coverage.standalone);
            debug!("{} WHERE sub-query rule(s)", spliced.len());
            for condition in spliced {
                coverage.push(query.with_select(Select {
                    selection: Some(condition),
                    ..matched.clone()
                }));
            }
        }

        if let Some(having) = &matched.having {
            let spliced = self.splice(having, scope, depth, &mut coverage.standalone);
            debug!("{} HAVING sub-query rule(s)", spliced.len());
            for condition in spliced {
                coverage.push(query.with_select(Select {
                    having: Some(condition),
                    ..matched.clone()
                }));
            }
        }
    }

    /// Conditions replacing each sub-query predicate of `condition` by
    /// `EXISTS (variant)` for every variant of its sub-select, next to
    /// whatever is left of the condition without the predicate.
    fn splice(
        &self,
        condition: &Arc<Expr>,
        scope: &Scope<'_>,
        depth: usize,
        standalone: &mut RuleSet,
    ) -> Vec<Arc<Expr>> {
        let mut out = Vec::new();

        for leaf in leaves(condition) {
            let subqueries = subqueries_of(&leaf);
            if subqueries.is_empty() {
                continue;
            }
            let remainder = without(condition, std::slice::from_ref(&leaf));

            for subquery in subqueries {
                let correlation = in_correlation(&leaf, &subquery, scope);
                let inner = self.cover_query(&subquery, Some(scope), depth + 1);
                standalone.extend(inner.standalone);

                for variant in inner.variants {
                    let variant = match &correlation {
                        Some(correlation) => correlate(&variant, correlation),
                        None => variant,
                    };
                    let exists = Expr::exists(variant);
                    out.push(match &remainder {
                        Some(remainder) => Expr::and_grouped(exists, remainder.clone()),
                        None => exists,
                    });
                }
            }
        }

        out
    }
}

fn derived_tables(factor: &TableFactor, out: &mut Vec<Arc<Query>>) {
    match factor {
        TableFactor::Table { .. } => {}
        TableFactor::Derived { subquery, .. } => out.push(subquery.clone()),
        TableFactor::NestedJoin { base, joins, .. } => {
            derived_tables(base, out);
            for join in joins {
                derived_tables(&join.relation, out);
            }
        }
    }
}

/// `x = <projection>` for `x IN (subquery)` when the sub-select projects
/// one plain expression and does not group. The outer operand must be a
/// column qualified by a relation the sub-select does not hide; an
/// unqualified one is qualified with its owner in `scope`.
fn in_correlation(leaf: &Expr, subquery: &Arc<Query>, scope: &Scope<'_>) -> Option<Arc<Expr>> {
    let Expr::InSubquery {
        expr,
        subquery: target,
        negated: false,
    } = leaf
    else {
        return None;
    };
    if !Arc::ptr_eq(target, subquery) {
        return None;
    }

    let select = subquery.as_select()?;
    if !select.group_by.is_empty() {
        return None;
    }
    let [SelectItem::Expr {
        expr: projected, ..
    }] = select.projection.as_slice()
    else {
        return None;
    };
    if !aggregates_of(projected).is_empty() {
        return None;
    }

    let outer = outer_operand(expr, select, scope)?;
    Some(Expr::compare(ComparisonOp::Eq, outer, projected.clone()))
}

/// The outer column qualified so that it still names the outer row inside
/// `inner`, or `None` if it cannot be.
fn outer_operand(expr: &Arc<Expr>, inner: &Select, scope: &Scope<'_>) -> Option<Arc<Expr>> {
    let column = expr.as_column()?;
    let qualifier = match column.relation() {
        Some(qualifier) => qualifier.to_string(),
        None => {
            let key = scope.relation_of(column)?;
            scope.relation(&key)?.name.clone()
        }
    };

    let hidden = inner
        .exposed_names()
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&qualifier));
    if hidden {
        debug!("IN operand {} is hidden inside its sub-select, no correlation", column);
        return None;
    }

    if column.qualifier.is_some() {
        return Some(expr.clone());
    }
    Some(Expr::column(ColumnRef::qualified(qualifier, column.name.clone())))
}

/// `variant` with `correlation` added to its WHERE clause.
fn correlate(variant: &Arc<Query>, correlation: &Arc<Expr>) -> Arc<Query> {
    let Some(select) = variant.as_select() else {
        return variant.clone();
    };
    let selection = match &select.selection {
        Some(selection) => Expr::and_grouped(selection.clone(), correlation.clone()),
        None => correlation.clone(),
    };
    Arc::new(variant.with_select(Select {
        selection: Some(selection),
        ..select.clone()
    }))
}
