//! Outer-increment join engine.
//!
//! For every conditioned join the engine forces the rows only an outer
//! join would produce: the join is relabelled LEFT (right side padded)
//! or RIGHT (left side padded), later joins that read a padded relation
//! follow as LEFT, and a WHERE filter selects exactly the padded rows.
//! The query's own WHERE clause is reduced against the padded relations
//! and kept next to the filter.

pub mod implicit;
pub mod increment;
pub mod labels;

use crate::null_reducer::{NullContext, reduce};
use catalog::NullabilityLookup;
use increment::{OuterIncrement, Synthesized, factor_keys};
use labels::{Labels, propagate};
use sql_syntax::ast::{ColumnRef, Expr, Join, JoinKind, Select};
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, trace};

pub use implicit::materialize_implicit_joins;

/// A candidate statement: the relabelled joins plus the WHERE clause that
/// goes with them.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinWhereItem {
    pub joins: Vec<Join>,
    pub selection: Option<Arc<Expr>>,
}

impl JoinWhereItem {
    /// `select` with this item's joins and WHERE clause.
    pub fn apply(&self, select: &Select) -> Select {
        Select {
            joins: self.joins.clone(),
            selection: self.selection.clone(),
            ..select.clone()
        }
    }
}

/// A WHERE filter selecting padded rows, with the columns it asserts NULL.
struct Filter {
    expr: Arc<Expr>,
    known_null: Vec<ColumnRef>,
}

/// Join and filter variants of `select`. Implicit joins are expected to
/// be materialized already.
pub fn generate(select: &Select, lookup: &dyn NullabilityLookup) -> Vec<JoinWhereItem> {
    let increments: Vec<Option<OuterIncrement>> = (0..select.joins.len())
        .map(|i| OuterIncrement::compute(select, i, lookup))
        .collect();

    let mut items = Vec::new();
    let mut baseline = false;

    for (index, increment) in increments.iter().enumerate() {
        let Some(increment) = increment else {
            continue;
        };
        if increment.synthesized == Synthesized::Both {
            debug!("Join {} has a constant ON condition, no outer rules", index);
            continue;
        }

        let tracked = increment.tracked_columns();

        if increment.has_left_columns() {
            let labels = propagate(
                select,
                &increments,
                index,
                JoinKind::Left,
                factor_keys(&select.joins[index].relation),
            );
            for filter in filters(increment, &increment.roi_columns, &increment.loi_columns, lookup) {
                items.push(item(select, &labels, filter, &tracked, lookup));
            }
        }

        if increment.has_right_columns() {
            let padded: BTreeSet<String> = select
                .factors()
                .take(index + 1)
                .flat_map(factor_keys)
                .collect();
            let labels = propagate(select, &increments, index, JoinKind::Right, padded);
            for filter in filters(increment, &increment.loi_columns, &increment.roi_columns, lookup) {
                items.push(item(select, &labels, filter, &tracked, lookup));
            }
        }

        if increment.synthesized == Synthesized::None {
            baseline = true;
        }
    }

    if baseline {
        items.insert(0, inner_baseline(select));
    }

    debug!("Generated {} join variant(s)", items.len());
    items
}

/// Filters selecting the rows where the `padded` side is NULL-extended
/// while the `preserved` side is kept.
///
/// When the padded side has columns of its own the first filter asserts
/// them NULL and the preserved columns NOT NULL; otherwise the rows are
/// the ones failing the ON condition. A second filter covers preserved
/// columns that are themselves NULL, when any of them may be.
fn filters(
    increment: &OuterIncrement,
    padded: &[ColumnRef],
    preserved: &[ColumnRef],
    lookup: &dyn NullabilityLookup,
) -> Vec<Filter> {
    let null_tests = |columns: &[ColumnRef], negated: bool| -> Vec<Arc<Expr>> {
        columns
            .iter()
            .map(|c| {
                let column = Expr::column(c.clone());
                if negated {
                    Expr::is_not_null(column)
                } else {
                    Expr::is_null(column)
                }
            })
            .collect()
    };

    let mut out = Vec::new();

    let guard = if padded.is_empty() {
        Some(Expr::not(Expr::nested(increment.on.clone())))
    } else {
        Expr::conjunction(
            null_tests(padded, false)
                .into_iter()
                .chain(null_tests(preserved, true)),
        )
    };
    if let Some(expr) = guard {
        out.push(Filter {
            expr,
            known_null: padded.to_vec(),
        });
    }

    if preserved.iter().any(|c| lookup.is_nullable(c)) {
        let tests = null_tests(padded, false)
            .into_iter()
            .chain(null_tests(preserved, false));
        if let Some(expr) = Expr::conjunction(tests) {
            out.push(Filter {
                expr,
                known_null: padded.iter().chain(preserved).cloned().collect(),
            });
        }
    }

    out
}

fn item(
    select: &Select,
    labels: &Labels,
    filter: Filter,
    tracked: &[ColumnRef],
    lookup: &dyn NullabilityLookup,
) -> JoinWhereItem {
    let joins = relabel(select, &labels.kinds);

    let ctx = NullContext {
        excluded: &labels.missing,
        known_null: &filter.known_null,
        tracked,
    };
    let remainder = select
        .selection
        .as_ref()
        .and_then(|selection| reduce(selection, &ctx, lookup));

    let selection = match remainder {
        Some(remainder) => Expr::and_grouped(filter.expr, remainder),
        None => filter.expr,
    };
    trace!("Join variant filter: {}", selection);

    JoinWhereItem {
        joins,
        selection: Some(selection),
    }
}

/// Every conditioned join INNER, WHERE untouched.
fn inner_baseline(select: &Select) -> JoinWhereItem {
    let kinds: Vec<JoinKind> = select
        .joins
        .iter()
        .map(|join| {
            if join.kind.is_unconditioned() {
                join.kind
            } else {
                JoinKind::Inner
            }
        })
        .collect();

    JoinWhereItem {
        joins: relabel(select, &kinds),
        selection: select.selection.clone().map(Expr::parenthesize),
    }
}

fn relabel(select: &Select, kinds: &[JoinKind]) -> Vec<Join> {
    select
        .joins
        .iter()
        .zip(kinds)
        .map(|(join, kind)| Join {
            kind: *kind,
            ..join.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{ColumnDef, Schema, Scope, TableDef};
    use sql_syntax::{ast::Query, parse};

    fn variants(sql: &str, schema: Option<&Schema>) -> Vec<String> {
        let query = parse(sql).unwrap();
        let select = query.as_select().unwrap();
        let scope = Scope::new(select, schema, None);
        generate(select, &scope)
            .iter()
            .map(|item| Query::from_select(item.apply(select)).to_string())
            .collect()
    }

    #[test]
    fn test_inner_join_outer_increments() {
        assert_eq!(
            variants("SELECT * FROM a INNER JOIN b ON a.id = b.id", None),
            vec![
                "SELECT * FROM a INNER JOIN b ON a.id = b.id",
                "SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE b.id IS NULL AND a.id IS NOT NULL",
                "SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE b.id IS NULL AND a.id IS NULL",
                "SELECT * FROM a RIGHT JOIN b ON a.id = b.id WHERE a.id IS NULL AND b.id IS NOT NULL",
                "SELECT * FROM a RIGHT JOIN b ON a.id = b.id WHERE a.id IS NULL AND b.id IS NULL",
            ]
        );
    }

    #[test]
    fn test_not_null_preserved_side_has_a_single_filter() {
        let schema = Schema {
            tables: vec![
                TableDef::new("a", vec![ColumnDef::not_null("id")]),
                TableDef::new("b", vec![ColumnDef::nullable("id")]),
            ],
        };
        let rules = variants("SELECT * FROM a JOIN b ON a.id = b.id", Some(&schema));
        assert_eq!(rules.len(), 4);
        assert!(rules.contains(&"SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE b.id IS NULL AND a.id IS NOT NULL".to_string()));
        assert!(!rules.iter().any(|r| r.contains("LEFT JOIN") && r.contains("a.id IS NULL")));
    }

    #[test]
    fn test_where_clause_is_reduced_against_padded_side() {
        let rules = variants(
            "SELECT * FROM a JOIN b ON a.id = b.id WHERE a.x = 1 AND b.y = 2",
            None,
        );
        assert!(rules.contains(
            &"SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE (b.id IS NULL AND a.id IS NOT NULL) AND a.x = 1"
                .to_string()
        ));
        assert!(rules.contains(
            &"SELECT * FROM a RIGHT JOIN b ON a.id = b.id WHERE (a.id IS NULL AND b.id IS NOT NULL) AND b.y = 2"
                .to_string()
        ));
    }

    #[test]
    fn test_one_sided_condition_uses_on_guard() {
        let rules = variants("SELECT * FROM a JOIN b ON b.flag = 1", None);
        assert_eq!(
            rules,
            vec![
                "SELECT * FROM a RIGHT JOIN b ON b.flag = 1 WHERE NOT (b.flag = 1)",
                "SELECT * FROM a RIGHT JOIN b ON b.flag = 1 WHERE b.flag IS NULL",
            ]
        );
    }

    #[test]
    fn test_constant_condition_has_no_rules() {
        assert!(variants("SELECT * FROM a JOIN b ON 1 = 1", None).is_empty());
    }

    #[test]
    fn test_downstream_join_follows_padded_relation() {
        let rules = variants(
            "SELECT * FROM a JOIN b ON a.id = b.aid JOIN c ON c.bid = b.id",
            None,
        );
        assert!(rules.contains(
            &"SELECT * FROM a LEFT JOIN b ON a.id = b.aid LEFT JOIN c ON c.bid = b.id WHERE b.aid IS NULL AND a.id IS NOT NULL"
                .to_string()
        ));
    }
}
