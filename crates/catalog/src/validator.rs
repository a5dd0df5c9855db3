use crate::{
    errors::SchemaError,
    schema::Schema,
    scope::Scope,
};
use sql_syntax::ast::{
    ColumnRef, Expr, Query, Select, SelectItem, SetExpr, TableFactor,
    visitor::{ExprVisitor, walk_expr},
};
use std::sync::Arc;
use tracing::debug;

/// Checks every table and column reference of `query` against `schema`,
/// failing with the first unknown or ambiguous name.
pub fn validate(query: &Query, schema: &Schema) -> Result<(), SchemaError> {
    let validator = SchemaValidator { schema };
    validator.validate_query(query, None)?;
    debug!("Schema validation passed");
    Ok(())
}

struct SchemaValidator<'s> {
    schema: &'s Schema,
}

impl<'s> SchemaValidator<'s> {
    fn validate_query(&self, query: &Query, parent: Option<&Scope<'_>>) -> Result<(), SchemaError> {
        match &query.body {
            // ORDER BY of a plain select sees the select's relations and aliases
            SetExpr::Select(select) => {
                let scope = self.validate_select(select, parent)?;
                for item in &query.order_by {
                    self.validate_expr(&item.expr, &scope, true)?;
                }
                Ok(())
            }
            body => self.validate_set_expr(body, parent),
        }
    }

    fn validate_set_expr(&self, body: &SetExpr, parent: Option<&Scope<'_>>) -> Result<(), SchemaError> {
        match body {
            SetExpr::Select(select) => self.validate_select(select, parent).map(|_| ()),
            SetExpr::Query(query) => self.validate_query(query, parent),
            SetExpr::SetOperation { left, right, .. } => {
                self.validate_set_expr(left, parent)?;
                self.validate_set_expr(right, parent)
            }
        }
    }

    fn validate_select<'p>(
        &self,
        select: &Select,
        parent: Option<&'p Scope<'p>>,
    ) -> Result<Scope<'p>, SchemaError>
    where
        's: 'p,
    {
        for factor in select.factors() {
            self.validate_factor(factor)?;
        }

        let scope = Scope::new(select, Some(self.schema), parent);

        for item in &select.projection {
            match item {
                SelectItem::Wildcard => {}
                SelectItem::QualifiedWildcard(name) => {
                    if scope.relation(name.base()).is_none() {
                        return Err(SchemaError::UnknownTable(name.to_string()));
                    }
                }
                SelectItem::Expr { expr, .. } => self.validate_expr(expr, &scope, false)?,
            }
        }

        for join in &select.joins {
            if let Some(on) = &join.on {
                self.validate_expr(on, &scope, false)?;
            }
        }
        if let Some(selection) = &select.selection {
            self.validate_expr(selection, &scope, false)?;
        }
        for key in &select.group_by {
            self.validate_expr(key, &scope, true)?;
        }
        if let Some(having) = &select.having {
            self.validate_expr(having, &scope, true)?;
        }

        Ok(scope)
    }

    fn validate_factor(&self, factor: &TableFactor) -> Result<(), SchemaError> {
        match factor {
            TableFactor::Table { name, .. } => match self.schema.table(name) {
                Some(_) => Ok(()),
                None => Err(SchemaError::UnknownTable(name.to_string())),
            },
            // Derived tables cannot see the enclosing FROM clause
            TableFactor::Derived { subquery, .. } => self.validate_query(subquery, None),
            TableFactor::NestedJoin { base, joins, .. } => {
                self.validate_factor(base)?;
                for join in joins {
                    self.validate_factor(&join.relation)?;
                }
                Ok(())
            }
        }
    }

    fn validate_expr(
        &self,
        expr: &Expr,
        scope: &Scope<'_>,
        allow_aliases: bool,
    ) -> Result<(), SchemaError> {
        let mut checker = ReferenceChecker::default();
        walk_expr(&mut checker, expr);

        for column in &checker.columns {
            match scope.resolve(column) {
                Ok(_) => {}
                Err(SchemaError::UnknownColumn(_))
                    if allow_aliases
                        && column.qualifier.is_none()
                        && scope.is_select_alias(&column.name) => {}
                Err(e) => return Err(e),
            }
        }

        for subquery in &checker.subqueries {
            self.validate_query(subquery, Some(scope))?;
        }

        Ok(())
    }
}

#[derive(Default)]
struct ReferenceChecker {
    columns: Vec<ColumnRef>,
    subqueries: Vec<Arc<Query>>,
}

impl ExprVisitor for ReferenceChecker {
    fn visit_column(&mut self, column: &ColumnRef) {
        self.columns.push(column.clone());
    }

    fn visit_subquery(&mut self, subquery: &Arc<Query>) {
        self.subqueries.push(subquery.clone());
    }
}
