pub mod expr;
pub mod ident;
pub mod literal;
pub mod operator;
pub mod query;
pub mod visitor;

pub use expr::{Expr, FunctionCall};
pub use ident::{ColumnRef, ObjectName};
pub use literal::Literal;
pub use operator::{ArithmeticOp, ComparisonOp, LogicalOp, Quantifier, SetOperator, UnaryOp};
pub use query::{Join, JoinKind, OrderByItem, Query, Select, SelectItem, SetExpr, TableFactor};
