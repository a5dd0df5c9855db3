use super::{
    expr::{Expr, FunctionCall},
    ident::ColumnRef,
    query::{Join, Query, Select, SelectItem, SetExpr, TableFactor},
};
use std::sync::Arc;

/// Visitor trait for expression traversal.
///
/// Subqueries are reported through `visit_subquery` but never entered, so a
/// walk only ever sees the columns of one query level.
pub trait ExprVisitor {
    fn visit_column(&mut self, _column: &ColumnRef) {}

    /// Return `false` to skip the call's arguments.
    fn enter_function(&mut self, _call: &FunctionCall) -> bool {
        true
    }

    fn visit_subquery(&mut self, _subquery: &Arc<Query>) {}
}

pub fn walk_expr<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Column(column) => visitor.visit_column(column),
        Expr::Literal(_) => {}
        Expr::Comparison { left, right, .. }
        | Expr::Logical { left, right, .. }
        | Expr::Arithmetic { left, right, .. } => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        Expr::Not(inner) | Expr::Nested(inner) => walk_expr(visitor, inner),
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => walk_expr(visitor, expr),
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(visitor, expr);
            walk_expr(visitor, low);
            walk_expr(visitor, high);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(visitor, expr);
            for item in list {
                walk_expr(visitor, item);
            }
        }
        Expr::Like { expr, pattern, .. } => {
            walk_expr(visitor, expr);
            walk_expr(visitor, pattern);
        }
        Expr::InSubquery { expr, subquery, .. } => {
            walk_expr(visitor, expr);
            visitor.visit_subquery(subquery);
        }
        Expr::Quantified { left, subquery, .. } => {
            walk_expr(visitor, left);
            visitor.visit_subquery(subquery);
        }
        Expr::Exists { subquery, .. } | Expr::Subquery(subquery) => {
            visitor.visit_subquery(subquery)
        }
        Expr::Function(call) => {
            if visitor.enter_function(call) {
                for arg in &call.args {
                    walk_expr(visitor, arg);
                }
            }
        }
    }
}

#[derive(Default)]
struct ColumnCollector {
    columns: Vec<ColumnRef>,
    skip_aggregates: bool,
}

impl ExprVisitor for ColumnCollector {
    fn visit_column(&mut self, column: &ColumnRef) {
        if !self.columns.contains(column) {
            self.columns.push(column.clone());
        }
    }

    fn enter_function(&mut self, call: &FunctionCall) -> bool {
        !(self.skip_aggregates && call.is_aggregate())
    }
}

/// Distinct columns referenced by `expr`, in order of first appearance.
pub fn columns_of(expr: &Expr) -> Vec<ColumnRef> {
    let mut collector = ColumnCollector::default();
    walk_expr(&mut collector, expr);
    collector.columns
}

/// Like [`columns_of`], ignoring columns that only appear as aggregate
/// arguments.
pub fn columns_outside_aggregates(expr: &Expr) -> Vec<ColumnRef> {
    let mut collector = ColumnCollector {
        skip_aggregates: true,
        ..Default::default()
    };
    walk_expr(&mut collector, expr);
    collector.columns
}

#[derive(Default)]
struct Finder {
    aggregates: Vec<FunctionCall>,
    subqueries: Vec<Arc<Query>>,
}

impl ExprVisitor for Finder {
    fn enter_function(&mut self, call: &FunctionCall) -> bool {
        if call.is_aggregate() {
            self.aggregates.push(call.clone());
        }
        true
    }

    fn visit_subquery(&mut self, subquery: &Arc<Query>) {
        self.subqueries.push(subquery.clone());
    }
}

/// Aggregate calls appearing in `expr`, outermost first.
pub fn aggregates_of(expr: &Expr) -> Vec<FunctionCall> {
    let mut finder = Finder::default();
    walk_expr(&mut finder, expr);
    finder.aggregates
}

/// Subqueries directly contained in `expr`; nested levels are not entered.
pub fn subqueries_of(expr: &Expr) -> Vec<Arc<Query>> {
    let mut finder = Finder::default();
    walk_expr(&mut finder, expr);
    finder.subqueries
}

/// Qualified columns of `query`, at any nesting depth, whose qualifier is
/// not a relation of the query itself: the query's references to the
/// queries enclosing it. Unqualified columns bind inside and are skipped.
pub fn outer_references(query: &Query) -> Vec<ColumnRef> {
    let mut out = Vec::new();
    outer_in_query(query, &[], &mut out);
    out
}

fn outer_in_query(query: &Query, local: &[String], out: &mut Vec<ColumnRef>) {
    outer_in_set(&query.body, local, out);
}

fn outer_in_set(body: &SetExpr, local: &[String], out: &mut Vec<ColumnRef>) {
    match body {
        SetExpr::Select(select) => outer_in_select(select, local, out),
        SetExpr::Query(inner) => outer_in_query(inner, local, out),
        SetExpr::SetOperation { left, right, .. } => {
            outer_in_set(left, local, out);
            outer_in_set(right, local, out);
        }
    }
}

fn outer_in_select(select: &Select, enclosing: &[String], out: &mut Vec<ColumnRef>) {
    let mut local = enclosing.to_vec();
    local.extend(select.exposed_names());

    let mut finder = OuterReferences {
        local: &local,
        out: &mut *out,
    };
    for item in &select.projection {
        if let SelectItem::Expr { expr, .. } = item {
            walk_expr(&mut finder, expr);
        }
    }
    for expr in select
        .selection
        .iter()
        .chain(&select.group_by)
        .chain(select.having.iter())
    {
        walk_expr(&mut finder, expr);
    }

    // Derived tables do not see their siblings
    if let Some(from) = &select.from {
        outer_in_factor(from, &local, enclosing, out);
    }
    outer_in_joins(&select.joins, &local, enclosing, out);
}

fn outer_in_factor(
    factor: &TableFactor,
    local: &[String],
    enclosing: &[String],
    out: &mut Vec<ColumnRef>,
) {
    match factor {
        TableFactor::Table { .. } => {}
        TableFactor::Derived { subquery, .. } => outer_in_query(subquery, enclosing, out),
        TableFactor::NestedJoin { base, joins, .. } => {
            outer_in_factor(base, local, enclosing, out);
            outer_in_joins(joins, local, enclosing, out);
        }
    }
}

fn outer_in_joins(joins: &[Join], local: &[String], enclosing: &[String], out: &mut Vec<ColumnRef>) {
    for join in joins {
        outer_in_factor(&join.relation, local, enclosing, out);
        if let Some(on) = &join.on {
            walk_expr(&mut OuterReferences { local, out: &mut *out }, on);
        }
    }
}

struct OuterReferences<'a> {
    local: &'a [String],
    out: &'a mut Vec<ColumnRef>,
}

impl ExprVisitor for OuterReferences<'_> {
    fn visit_column(&mut self, column: &ColumnRef) {
        let Some(qualifier) = column.relation() else {
            return;
        };
        if !self.local.iter().any(|name| name.eq_ignore_ascii_case(qualifier))
            && !self.out.contains(column)
        {
            self.out.push(column.clone());
        }
    }

    fn visit_subquery(&mut self, subquery: &Arc<Query>) {
        outer_in_query(subquery, self.local, self.out);
    }
}
