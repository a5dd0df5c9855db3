//! Boolean-structure helpers shared by the rule generators.
//!
//! `Logical`, `Not` and `Nested` nodes form the boolean skeleton of a
//! condition; every other node is a leaf predicate.

use catalog::NullabilityLookup;
use sql_syntax::ast::{Expr, LogicalOp, visitor::columns_of};
use std::{collections::BTreeSet, sync::Arc};

/// Splits a condition on its top-level ANDs, looking through parentheses.
pub fn conjuncts(expr: &Arc<Expr>) -> Vec<Arc<Expr>> {
    let mut out = Vec::new();
    collect_conjuncts(expr, &mut out);
    out
}

fn collect_conjuncts(expr: &Arc<Expr>, out: &mut Vec<Arc<Expr>>) {
    match expr.as_ref() {
        Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            collect_conjuncts(left, out);
            collect_conjuncts(right, out);
        }
        Expr::Nested(inner)
            if matches!(
                inner.as_ref(),
                Expr::Logical {
                    op: LogicalOp::And,
                    ..
                }
            ) =>
        {
            collect_conjuncts(inner, out)
        }
        _ => out.push(expr.clone()),
    }
}

/// Every leaf predicate of a condition, left to right.
pub fn leaves(expr: &Arc<Expr>) -> Vec<Arc<Expr>> {
    let mut out = Vec::new();
    collect_leaves(expr, &mut out);
    out
}

fn collect_leaves(expr: &Arc<Expr>, out: &mut Vec<Arc<Expr>>) {
    match expr.as_ref() {
        Expr::Logical { left, right, .. } => {
            collect_leaves(left, out);
            collect_leaves(right, out);
        }
        Expr::Not(inner) | Expr::Nested(inner) => collect_leaves(inner, out),
        _ => out.push(expr.clone()),
    }
}

/// Removes the leaves selected by `drop` and propagates the removal: a
/// binary AND/OR whose one side vanished collapses to the other side, a
/// NOT or parenthesized group vanishes with its operand, and a group left
/// with a single predicate loses its parentheses. Returns `None`
/// when nothing is left. Untouched subtrees are shared with the input.
pub fn prune(expr: &Arc<Expr>, drop: &dyn Fn(&Arc<Expr>) -> bool) -> Option<Arc<Expr>> {
    match expr.as_ref() {
        Expr::Logical { op, left, right } => match (prune(left, drop), prune(right, drop)) {
            (Some(l), Some(r)) => {
                if Arc::ptr_eq(&l, left) && Arc::ptr_eq(&r, right) {
                    Some(expr.clone())
                } else {
                    Some(Arc::new(Expr::Logical {
                        op: *op,
                        left: l,
                        right: r,
                    }))
                }
            }
            (Some(side), None) | (None, Some(side)) => Some(side),
            (None, None) => None,
        },
        Expr::Not(inner) => prune(inner, drop).map(|kept| {
            if Arc::ptr_eq(&kept, inner) {
                expr.clone()
            } else {
                Expr::not(kept)
            }
        }),
        Expr::Nested(inner) => prune(inner, drop).map(|kept| {
            if Arc::ptr_eq(&kept, inner) {
                expr.clone()
            } else {
                Expr::parenthesize(kept)
            }
        }),
        _ if drop(expr) => None,
        _ => Some(expr.clone()),
    }
}

/// `expr` with the given leaf nodes (matched by identity) removed.
pub fn without(expr: &Arc<Expr>, targets: &[Arc<Expr>]) -> Option<Arc<Expr>> {
    prune(expr, &|node| targets.iter().any(|t| Arc::ptr_eq(t, node)))
}

/// Relations of the current query level referenced by `expr`, or `None`
/// if some column cannot be attributed to one.
pub fn relations_in(expr: &Expr, lookup: &dyn NullabilityLookup) -> Option<BTreeSet<String>> {
    columns_of(expr)
        .iter()
        .map(|column| lookup.relation_of(column))
        .collect()
}
