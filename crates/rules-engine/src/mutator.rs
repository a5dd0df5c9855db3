//! Expression mutator: MC/DC alternatives for a boolean condition.
//!
//! Every leaf predicate is replaced in turn by each of its alternatives
//! while the rest of the condition stays as written, so each alternative
//! isolates the effect of one leaf on the outcome.

use catalog::NullabilityLookup;
use sql_syntax::{
    ast::{ArithmeticOp, ComparisonOp, Expr, Literal, UnaryOp, visitor::columns_outside_aggregates},
    to_sql,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, trace};

/// All single-leaf alternatives of `expr`, deduplicated by rendered text.
pub fn mutate(expr: &Arc<Expr>, lookup: &dyn NullabilityLookup) -> Vec<Arc<Expr>> {
    let mut seen = HashSet::new();
    let alternatives: Vec<Arc<Expr>> = mutate_node(expr, lookup)
        .into_iter()
        .filter(|alt| seen.insert(to_sql(alt.as_ref())))
        .collect();

    debug!("{} alternative(s) for condition {}", alternatives.len(), expr);
    for alt in &alternatives {
        trace!("  {}", alt);
    }
    alternatives
}

fn mutate_node(expr: &Arc<Expr>, lookup: &dyn NullabilityLookup) -> Vec<Arc<Expr>> {
    match expr.as_ref() {
        Expr::Logical { op, left, right } => {
            let rebuild = |l: Arc<Expr>, r: Arc<Expr>| {
                Arc::new(Expr::Logical {
                    op: *op,
                    left: Expr::parenthesize(l),
                    right: Expr::parenthesize(r),
                })
            };

            let mut out: Vec<Arc<Expr>> = mutate_node(left, lookup)
                .into_iter()
                .map(|alt| rebuild(alt, right.clone()))
                .collect();
            out.extend(
                mutate_node(right, lookup)
                    .into_iter()
                    .map(|alt| rebuild(left.clone(), alt)),
            );
            out
        }
        Expr::Not(inner) => mutate_node(inner, lookup)
            .into_iter()
            .map(|alt| Expr::not(Expr::parenthesize(alt)))
            .collect(),
        Expr::Nested(inner) => mutate_node(inner, lookup)
            .into_iter()
            .map(Expr::nested)
            .collect(),
        _ => leaf_alternatives(expr, lookup),
    }
}

fn leaf_alternatives(leaf: &Arc<Expr>, lookup: &dyn NullabilityLookup) -> Vec<Arc<Expr>> {
    let mut alternatives = match leaf.as_ref() {
        Expr::Comparison { op, left, right } => comparison_alternatives(*op, left, right),
        Expr::Between {
            expr, low, high, ..
        } => between_alternatives(expr, low, high),
        Expr::IsNull { expr, .. } => vec![Expr::is_null(expr.clone()), Expr::is_not_null(expr.clone())],
        Expr::InList { expr, list, .. } => {
            assert!(!list.is_empty(), "IN predicate with an empty value list");
            [false, true]
                .map(|negated| {
                    Arc::new(Expr::InList {
                        expr: expr.clone(),
                        list: list.clone(),
                        negated,
                    })
                })
                .to_vec()
        }
        Expr::InSubquery { expr, subquery, .. } => [false, true]
            .map(|negated| {
                Arc::new(Expr::InSubquery {
                    expr: expr.clone(),
                    subquery: subquery.clone(),
                    negated,
                })
            })
            .to_vec(),
        Expr::Like { expr, pattern, .. } => [false, true]
            .map(|negated| {
                Arc::new(Expr::Like {
                    expr: expr.clone(),
                    pattern: pattern.clone(),
                    negated,
                })
            })
            .to_vec(),
        Expr::Exists { subquery, .. } => [false, true]
            .map(|negated| {
                Arc::new(Expr::Exists {
                    subquery: subquery.clone(),
                    negated,
                })
            })
            .to_vec(),
        Expr::Quantified {
            left,
            quantifier,
            subquery,
            ..
        } => [ComparisonOp::Lt, ComparisonOp::Eq, ComparisonOp::Gt]
            .map(|op| {
                Arc::new(Expr::Quantified {
                    op,
                    left: left.clone(),
                    quantifier: *quantifier,
                    subquery: subquery.clone(),
                })
            })
            .to_vec(),
        // Bare boolean: a column, function call or literal used as a predicate
        _ => vec![leaf.clone(), Expr::not(leaf.clone())],
    };

    alternatives.extend(null_alternatives(leaf, lookup));
    alternatives
}

/// `col IS NULL` for every nullable column the leaf reads outside of
/// aggregate calls and sub-selects.
fn null_alternatives(leaf: &Expr, lookup: &dyn NullabilityLookup) -> Vec<Arc<Expr>> {
    columns_outside_aggregates(leaf)
        .into_iter()
        .filter(|column| lookup.is_nullable(column))
        .map(|column| Expr::is_null(Expr::column(column)))
        .collect()
}

fn comparison_alternatives(op: ComparisonOp, left: &Arc<Expr>, right: &Arc<Expr>) -> Vec<Arc<Expr>> {
    let eq = |l: Arc<Expr>, r: Arc<Expr>| Expr::compare(ComparisonOp::Eq, l, r);

    if let Some([below, above]) = boundaries(right) {
        return vec![
            eq(left.clone(), below),
            eq(left.clone(), right.clone()),
            eq(left.clone(), above),
        ];
    }
    if let Some([below, above]) = boundaries(left) {
        return vec![
            eq(below, right.clone()),
            eq(left.clone(), right.clone()),
            eq(above, right.clone()),
        ];
    }

    let is_string = |e: &Expr| matches!(e.unnested(), Expr::Literal(Literal::String(_)));
    if matches!(op, ComparisonOp::Eq | ComparisonOp::NotEq)
        && (is_string(right) || is_string(left))
    {
        let equal = eq(left.clone(), right.clone());
        return vec![equal.clone(), Expr::not(Expr::nested(equal))];
    }

    [ComparisonOp::Lt, ComparisonOp::Eq, ComparisonOp::Gt]
        .map(|op| Expr::compare(op, left.clone(), right.clone()))
        .to_vec()
}

fn between_alternatives(expr: &Arc<Expr>, low: &Arc<Expr>, high: &Arc<Expr>) -> Vec<Arc<Expr>> {
    let eq = |bound: Arc<Expr>| Expr::compare(ComparisonOp::Eq, expr.clone(), bound);
    let between = |negated: bool| {
        Arc::new(Expr::Between {
            expr: expr.clone(),
            low: low.clone(),
            high: high.clone(),
            negated,
        })
    };

    let mut out = Vec::new();
    if let Some(below) = shift(low, -1) {
        out.push(eq(below));
    }
    out.push(eq(low.clone()));
    out.push(eq(high.clone()));
    if let Some(above) = shift(high, 1) {
        out.push(eq(above));
    }
    out.push(between(false));
    out.push(between(true));
    out
}

/// The operand shifted one below and one above, if it is numeric.
fn boundaries(expr: &Arc<Expr>) -> Option<[Arc<Expr>; 2]> {
    Some([shift(expr, -1)?, shift(expr, 1)?])
}

/// Adds `delta` to the innermost numeric literal of `expr`, looking
/// through signs, parentheses and `+`/`-` wrappers such as `col + 5`.
fn shift(expr: &Arc<Expr>, delta: i64) -> Option<Arc<Expr>> {
    match expr.as_ref() {
        Expr::Literal(literal) => literal.offset(delta).map(Expr::literal),
        // -5 shifted by one is the literal -4, not -(4)
        Expr::Unary {
            op: UnaryOp::Minus,
            expr: operand,
        } => match operand.as_ref() {
            Expr::Literal(literal) if literal.is_numeric() => literal
                .negated()
                .and_then(|negated| negated.offset(delta))
                .map(Expr::literal),
            _ => shift(operand, -delta).map(|shifted| {
                Arc::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    expr: shifted,
                })
            }),
        },
        Expr::Unary {
            op: UnaryOp::Plus,
            expr: operand,
        } => shift(operand, delta).map(|shifted| {
            Arc::new(Expr::Unary {
                op: UnaryOp::Plus,
                expr: shifted,
            })
        }),
        Expr::Nested(inner) => shift(inner, delta).map(Expr::nested),
        Expr::Arithmetic { op, left, right } if op.is_additive() => {
            let right_delta = if *op == ArithmeticOp::Subtract { -delta } else { delta };
            let rebuild = |l: Arc<Expr>, r: Arc<Expr>| {
                Arc::new(Expr::Arithmetic {
                    op: *op,
                    left: l,
                    right: r,
                })
            };
            match shift(right, right_delta) {
                Some(shifted) => Some(rebuild(left.clone(), shifted)),
                None => shift(left, delta).map(|shifted| rebuild(shifted, right.clone())),
            }
        }
        _ => None,
    }
}
