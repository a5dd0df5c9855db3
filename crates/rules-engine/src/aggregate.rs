//! Structural HAVING rules for grouped and aggregating queries.

use catalog::NullabilityLookup;
use sql_syntax::ast::{
    ComparisonOp, Expr, FunctionCall, Select, SelectItem,
    visitor::aggregates_of,
};
use std::{collections::HashSet, sync::Arc};
use tracing::debug;

/// One aggregate rule. Rules that replace the select list cannot keep the
/// query's ORDER BY / LIMIT tail.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRule {
    pub select: Select,
    pub keep_tail: bool,
}

pub fn aggregate_rules(select: &Select, lookup: &dyn NullabilityLookup) -> Vec<AggregateRule> {
    let aggregates: Vec<FunctionCall> = select
        .projection
        .iter()
        .filter_map(|item| match item {
            SelectItem::Expr { expr, .. } => Some(aggregates_of(expr)),
            _ => None,
        })
        .flatten()
        .collect();

    if aggregates.is_empty() && select.group_by.is_empty() {
        return Vec::new();
    }

    let mut rules = Vec::new();

    // At least one group with several rows
    rules.push(with_having(select, greater(Expr::count_star(), Expr::integer(1))));

    // A grouping key that really splits rows: drop it from GROUP BY and
    // ask for a remaining group holding several of its values
    for (index, key) in select.group_by.iter().enumerate() {
        let group_by = select
            .group_by
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, k)| k.clone())
            .collect();
        rules.push(AggregateRule {
            select: Select {
                distinct: false,
                projection: vec![SelectItem::Expr {
                    expr: Expr::count_star(),
                    alias: None,
                }],
                group_by,
                having: Some(greater(
                    Expr::function("COUNT", vec![key.clone()], true),
                    Expr::integer(1),
                )),
                ..select.clone()
            },
            keep_tail: false,
        });
    }

    // Per distinct argument of the other aggregates: NULL rows inside a
    // group, then repeated values inside a group
    let mut seen = HashSet::new();
    for call in aggregates.iter().filter(|call| !call.is_count()) {
        let [arg] = call.args.as_slice() else {
            continue;
        };
        if !seen.insert(arg.to_string()) {
            continue;
        }

        let column = arg.as_column();
        let may_be_null = column.is_none_or(|c| lookup.is_nullable(c));
        let unique = column.is_some_and(|c| lookup.is_unique(c));

        if may_be_null {
            rules.push(with_having(
                select,
                greater(Expr::count_star(), Expr::function("COUNT", vec![arg.clone()], false)),
            ));
        }
        if !unique {
            rules.push(with_having(
                select,
                greater(
                    Expr::function("COUNT", vec![arg.clone()], false),
                    Expr::function("COUNT", vec![arg.clone()], true),
                ),
            ));
        }
    }

    debug!("Generated {} aggregate rule(s)", rules.len());
    rules
}

fn greater(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    Expr::compare(ComparisonOp::Gt, left, right)
}

/// `select` with `condition` added to its HAVING clause.
fn with_having(select: &Select, condition: Arc<Expr>) -> AggregateRule {
    let having = match &select.having {
        Some(existing) => Expr::and_grouped(existing.clone(), condition),
        None => condition,
    };
    AggregateRule {
        select: Select {
            having: Some(having),
            ..select.clone()
        },
        keep_tail: true,
    }
}
