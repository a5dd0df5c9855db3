use crate::{
    ast::{ColumnRef, Expr, FunctionCall, LogicalOp, ObjectName},
    render::{Render, Renderer},
};

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_PREDICATE: u8 = 4;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_ATOM: u8 = 8;

/// Binding strength of the node's outermost operator.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Logical {
            op: LogicalOp::Or, ..
        } => PREC_OR,
        Expr::Logical {
            op: LogicalOp::And,
            ..
        } => PREC_AND,
        Expr::Not(_) => PREC_NOT,
        Expr::Exists { negated: true, .. } => PREC_NOT,
        Expr::Comparison { .. }
        | Expr::IsNull { .. }
        | Expr::Between { .. }
        | Expr::InList { .. }
        | Expr::InSubquery { .. }
        | Expr::Like { .. }
        | Expr::Quantified { .. } => PREC_PREDICATE,
        Expr::Arithmetic { op, .. } if op.is_additive() => PREC_ADDITIVE,
        Expr::Arithmetic { .. } => PREC_MULTIPLICATIVE,
        Expr::Unary { .. } => PREC_UNARY,
        // A negative literal reads like a unary minus
        Expr::Literal(literal) if literal.to_string().starts_with('-') => PREC_UNARY,
        Expr::Column(_)
        | Expr::Literal(_)
        | Expr::Function(_)
        | Expr::Subquery(_)
        | Expr::Exists { .. }
        | Expr::Nested(_) => PREC_ATOM,
    }
}

/// Renders `expr`, adding parentheses only when the tree shape would
/// otherwise be read back differently. Trees built by the parser always
/// carry explicit `Nested` nodes where needed, so they render verbatim.
fn operand(r: &mut Renderer, expr: &Expr, min: u8) {
    if precedence(expr) < min {
        r.sql.push('(');
        expr.render(r);
        r.sql.push(')');
    } else {
        expr.render(r);
    }
}

fn keyword_if(r: &mut Renderer, flag: bool, keyword: &str) {
    if flag {
        r.sql.push_str(keyword);
    }
}

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Column(column) => column.render(r),
            Expr::Literal(literal) => r.push_display(literal),
            Expr::Comparison { op, left, right } => {
                operand(r, left, PREC_ADDITIVE);
                r.sql.push(' ');
                r.push_display(op);
                r.sql.push(' ');
                operand(r, right, PREC_ADDITIVE);
            }
            Expr::Logical { op, left, right } => {
                let prec = precedence(self);
                operand(r, left, prec);
                r.sql.push(' ');
                r.push_display(op);
                r.sql.push(' ');
                operand(r, right, prec + 1);
            }
            Expr::Not(inner) => {
                r.sql.push_str("NOT ");
                operand(r, inner, PREC_NOT);
            }
            Expr::IsNull { expr, negated } => {
                operand(r, expr, PREC_ADDITIVE);
                r.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                operand(r, expr, PREC_ADDITIVE);
                keyword_if(r, *negated, " NOT");
                r.sql.push_str(" BETWEEN ");
                operand(r, low, PREC_ADDITIVE);
                r.sql.push_str(" AND ");
                operand(r, high, PREC_ADDITIVE);
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                operand(r, expr, PREC_ADDITIVE);
                keyword_if(r, *negated, " NOT");
                r.sql.push_str(" IN (");
                r.push_list(list);
                r.sql.push(')');
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                operand(r, expr, PREC_ADDITIVE);
                keyword_if(r, *negated, " NOT");
                r.sql.push_str(" IN (");
                subquery.render(r);
                r.sql.push(')');
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                operand(r, expr, PREC_ADDITIVE);
                keyword_if(r, *negated, " NOT");
                r.sql.push_str(" LIKE ");
                operand(r, pattern, PREC_ADDITIVE);
            }
            Expr::Exists { subquery, negated } => {
                keyword_if(r, *negated, "NOT ");
                r.sql.push_str("EXISTS (");
                subquery.render(r);
                r.sql.push(')');
            }
            Expr::Subquery(subquery) => {
                r.sql.push('(');
                subquery.render(r);
                r.sql.push(')');
            }
            Expr::Quantified {
                op,
                left,
                quantifier,
                subquery,
            } => {
                operand(r, left, PREC_ADDITIVE);
                r.sql.push(' ');
                r.push_display(op);
                r.sql.push(' ');
                r.push_display(quantifier);
                r.sql.push_str(" (");
                subquery.render(r);
                r.sql.push(')');
            }
            Expr::Function(call) => call.render(r),
            Expr::Arithmetic { op, left, right } => {
                let prec = precedence(self);
                operand(r, left, prec);
                r.sql.push(' ');
                r.push_display(op);
                r.sql.push(' ');
                operand(r, right, prec + 1);
            }
            Expr::Unary { op, expr } => {
                r.push_display(op);
                operand(r, expr, PREC_ATOM);
            }
            Expr::Nested(inner) => {
                r.sql.push('(');
                inner.render(r);
                r.sql.push(')');
            }
        }
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.wildcard {
            r.sql.push('*');
        } else {
            keyword_if(r, self.distinct, "DISTINCT ");
            r.push_list(&self.args);
        }
        r.sql.push(')');
    }
}

impl Render for ColumnRef {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            qualifier.render(r);
            r.sql.push('.');
        }
        r.push_ident(&self.name);
    }
}

impl Render for ObjectName {
    fn render(&self, r: &mut Renderer) {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                r.sql.push('.');
            }
            r.push_ident(part);
        }
    }
}
