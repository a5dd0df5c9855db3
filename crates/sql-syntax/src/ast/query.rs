use super::{expr::Expr, ident::ObjectName, operator::SetOperator};
use serde::Serialize;
use std::sync::Arc;

/// A complete query: a set expression plus its ordering and paging tail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub body: SetExpr,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Arc<Expr>>,
    pub offset: Option<Arc<Expr>>,
}

impl Query {
    pub fn from_select(select: Select) -> Self {
        Query {
            body: SetExpr::Select(Box::new(select)),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Same ordering and paging tail around a different select.
    pub fn with_select(&self, select: Select) -> Self {
        Query {
            body: SetExpr::Select(Box::new(select)),
            order_by: self.order_by.clone(),
            limit: self.limit.clone(),
            offset: self.offset.clone(),
        }
    }

    /// The select block when the body is a single SELECT.
    pub fn as_select(&self) -> Option<&Select> {
        match &self.body {
            SetExpr::Select(select) => Some(select),
            SetExpr::Query(inner) if inner.has_no_tail() => inner.as_select(),
            _ => None,
        }
    }

    pub fn has_no_tail(&self) -> bool {
        self.order_by.is_empty() && self.limit.is_none() && self.offset.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SetExpr {
    Select(Box<Select>),
    /// Parenthesized query inside a set operation
    Query(Box<Query>),
    SetOperation {
        op: SetOperator,
        all: bool,
        left: Box<SetExpr>,
        right: Box<SetExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: Option<TableFactor>,
    pub joins: Vec<Join>,
    pub selection: Option<Arc<Expr>>,
    pub group_by: Vec<Arc<Expr>>,
    pub having: Option<Arc<Expr>>,
}

impl Select {
    /// All factors of the FROM clause in order: the base relation first,
    /// then the relation of every join.
    pub fn factors(&self) -> impl Iterator<Item = &TableFactor> {
        self.from
            .iter()
            .chain(self.joins.iter().map(|join| &join.relation))
    }

    /// Relation names visible to expressions of this select.
    pub fn exposed_names(&self) -> Vec<String> {
        self.factors()
            .flat_map(TableFactor::exposed_names)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectItem {
    Wildcard,
    QualifiedWildcard(ObjectName),
    Expr {
        expr: Arc<Expr>,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableFactor {
    Table {
        name: ObjectName,
        alias: Option<String>,
    },
    Derived {
        subquery: Arc<Query>,
        alias: Option<String>,
    },
    NestedJoin {
        base: Box<TableFactor>,
        joins: Vec<Join>,
        alias: Option<String>,
    },
}

impl TableFactor {
    pub fn table(name: &str) -> Self {
        TableFactor::Table {
            name: ObjectName::new(name),
            alias: None,
        }
    }

    /// Names under which this factor's columns can be referenced. A
    /// nested join without an alias exposes every relation inside it.
    pub fn exposed_names(&self) -> Vec<String> {
        match self {
            TableFactor::Table { name, alias } => {
                vec![alias.clone().unwrap_or_else(|| name.base().to_string())]
            }
            TableFactor::Derived { alias, .. } => alias.iter().cloned().collect(),
            TableFactor::NestedJoin { alias: Some(alias), .. } => vec![alias.clone()],
            TableFactor::NestedJoin { base, joins, .. } => base
                .exposed_names()
                .into_iter()
                .chain(joins.iter().flat_map(|j| j.relation.exposed_names()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JoinKind {
    /// Comma separated relation
    Simple,
    Cross,
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    /// Simple and cross joins carry no ON condition.
    pub fn is_unconditioned(&self) -> bool {
        matches!(self, JoinKind::Simple | JoinKind::Cross)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Join {
    pub relation: TableFactor,
    pub kind: JoinKind,
    pub on: Option<Arc<Expr>>,
}

impl Join {
    /// The ON condition of a conditioned join.
    ///
    /// # Panics
    ///
    /// Panics when a conditioned join has no ON condition. The parser never
    /// builds one, so reaching this is a bug in whatever constructed it.
    pub fn on_condition(&self) -> Option<&Arc<Expr>> {
        if self.kind.is_unconditioned() {
            return None;
        }
        match &self.on {
            Some(on) => Some(on),
            None => panic!("{:?} join without an ON condition", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByItem {
    pub expr: Arc<Expr>,
    pub descending: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(kind: JoinKind) -> Join {
        Join {
            relation: TableFactor::table("b"),
            kind,
            on: None,
        }
    }

    #[test]
    fn test_unconditioned_joins_have_no_on_condition() {
        assert!(join(JoinKind::Simple).on_condition().is_none());
        assert!(join(JoinKind::Cross).on_condition().is_none());
    }

    #[test]
    #[should_panic(expected = "without an ON condition")]
    fn test_conditioned_join_without_on_condition_panics() {
        join(JoinKind::Left).on_condition();
    }
}
