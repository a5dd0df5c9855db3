use super::{
    ident::ColumnRef,
    literal::Literal,
    operator::{ArithmeticOp, ComparisonOp, LogicalOp, Quantifier, UnaryOp},
    query::Query,
};
use serde::Serialize;
use std::sync::Arc;

/// Aggregate functions recognised in select lists and HAVING clauses.
pub const AGGREGATE_FUNCTIONS: &[&str] = &[
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "STDDEV",
    "VARIANCE",
    "GROUP_CONCAT",
    "STRING_AGG",
    "ARRAY_AGG",
    "BOOL_AND",
    "BOOL_OR",
    "EVERY",
];

/// Scalar and boolean expressions.
///
/// Children are reference counted so that rule variants can share every
/// subtree they do not rewrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    Comparison {
        op: ComparisonOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
    },
    Not(Arc<Expr>),
    IsNull {
        expr: Arc<Expr>,
        negated: bool,
    },
    Between {
        expr: Arc<Expr>,
        low: Arc<Expr>,
        high: Arc<Expr>,
        negated: bool,
    },
    InList {
        expr: Arc<Expr>,
        list: Vec<Arc<Expr>>,
        negated: bool,
    },
    InSubquery {
        expr: Arc<Expr>,
        subquery: Arc<Query>,
        negated: bool,
    },
    Like {
        expr: Arc<Expr>,
        pattern: Arc<Expr>,
        negated: bool,
    },
    Exists {
        subquery: Arc<Query>,
        negated: bool,
    },
    /// Scalar subquery used as an operand.
    Subquery(Arc<Query>),
    Quantified {
        op: ComparisonOp,
        left: Arc<Expr>,
        quantifier: Quantifier,
        subquery: Arc<Query>,
    },
    Function(FunctionCall),
    Arithmetic {
        op: ArithmeticOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Arc<Expr>,
    },
    /// Explicit parentheses.
    Nested(Arc<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Arc<Expr>>,
    pub distinct: bool,
    /// `COUNT(*)` style call
    pub wildcard: bool,
}

impl FunctionCall {
    pub fn is_aggregate(&self) -> bool {
        AGGREGATE_FUNCTIONS
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&self.name))
    }

    pub fn is_count(&self) -> bool {
        self.name.eq_ignore_ascii_case("COUNT")
    }
}

impl Expr {
    pub fn column(column: ColumnRef) -> Arc<Expr> {
        Arc::new(Expr::Column(column))
    }

    pub fn literal(literal: Literal) -> Arc<Expr> {
        Arc::new(Expr::Literal(literal))
    }

    pub fn integer(value: i64) -> Arc<Expr> {
        Arc::new(Expr::Literal(Literal::Integer(value)))
    }

    pub fn compare(op: ComparisonOp, left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Comparison { op, left, right })
    }

    pub fn and(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        })
    }

    pub fn or(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Logical {
            op: LogicalOp::Or,
            left,
            right,
        })
    }

    pub fn not(inner: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Not(inner))
    }

    pub fn is_null(expr: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::IsNull {
            expr,
            negated: false,
        })
    }

    pub fn is_not_null(expr: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::IsNull {
            expr,
            negated: true,
        })
    }

    pub fn exists(subquery: Arc<Query>) -> Arc<Expr> {
        Arc::new(Expr::Exists {
            subquery,
            negated: false,
        })
    }

    /// Wraps `expr` in parentheses unless it already is parenthesized.
    pub fn nested(expr: Arc<Expr>) -> Arc<Expr> {
        match expr.as_ref() {
            Expr::Nested(_) => expr,
            _ => Arc::new(Expr::Nested(expr)),
        }
    }

    /// Parenthesizes AND/OR expressions; everything else stays bare.
    pub fn parenthesize(expr: Arc<Expr>) -> Arc<Expr> {
        match expr.as_ref() {
            Expr::Logical { .. } => Expr::nested(expr),
            _ => expr,
        }
    }

    pub fn function(name: &str, args: Vec<Arc<Expr>>, distinct: bool) -> Arc<Expr> {
        Arc::new(Expr::Function(FunctionCall {
            name: name.to_string(),
            args,
            distinct,
            wildcard: false,
        }))
    }

    pub fn count_star() -> Arc<Expr> {
        Arc::new(Expr::Function(FunctionCall {
            name: "COUNT".to_string(),
            args: Vec::new(),
            distinct: false,
            wildcard: true,
        }))
    }

    /// Joins the given expressions with AND, left to right.
    pub fn conjunction(exprs: impl IntoIterator<Item = Arc<Expr>>) -> Option<Arc<Expr>> {
        exprs.into_iter().reduce(Expr::and)
    }

    /// `left AND right` with each side parenthesized when compound.
    pub fn and_grouped(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
        Expr::and(Expr::parenthesize(left), Expr::parenthesize(right))
    }

    /// Strips any number of enclosing parentheses.
    pub fn unnested(&self) -> &Expr {
        match self {
            Expr::Nested(inner) => inner.unnested(),
            other => other,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self.unnested() {
            Expr::Column(column) => Some(column),
            _ => None,
        }
    }
}
