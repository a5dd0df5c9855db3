use crate::{
    ast::{Join, JoinKind, OrderByItem, Query, Select, SelectItem, SetExpr, TableFactor},
    render::{Render, Renderer},
};

impl Render for Query {
    fn render(&self, r: &mut Renderer) {
        self.body.render(r);

        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            r.push_list(&self.order_by);
        }

        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for SetExpr {
    fn render(&self, r: &mut Renderer) {
        match self {
            SetExpr::Select(select) => select.render(r),
            SetExpr::Query(query) => {
                r.sql.push('(');
                query.render(r);
                r.sql.push(')');
            }
            SetExpr::SetOperation {
                op,
                all,
                left,
                right,
            } => {
                left.render(r);
                r.sql.push(' ');
                r.push_display(op);
                if *all {
                    r.sql.push_str(" ALL");
                }
                r.sql.push(' ');
                if matches!(right.as_ref(), SetExpr::SetOperation { .. }) {
                    r.sql.push('(');
                    right.render(r);
                    r.sql.push(')');
                } else {
                    right.render(r);
                }
            }
        }
    }
}

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        if self.distinct {
            r.sql.push_str("DISTINCT ");
        }
        r.push_list(&self.projection);

        if let Some(from) = &self.from {
            r.sql.push_str(" FROM ");
            from.render(r);
            for join in &self.joins {
                join.render(r);
            }
        }

        if let Some(selection) = &self.selection {
            r.sql.push_str(" WHERE ");
            selection.render(r);
        }

        if !self.group_by.is_empty() {
            r.sql.push_str(" GROUP BY ");
            r.push_list(&self.group_by);
        }

        if let Some(having) = &self.having {
            r.sql.push_str(" HAVING ");
            having.render(r);
        }
    }
}

impl Render for SelectItem {
    fn render(&self, r: &mut Renderer) {
        match self {
            SelectItem::Wildcard => r.sql.push('*'),
            SelectItem::QualifiedWildcard(name) => {
                name.render(r);
                r.sql.push_str(".*");
            }
            SelectItem::Expr { expr, alias } => {
                expr.render(r);
                render_alias(r, alias.as_deref());
            }
        }
    }
}

fn render_alias(r: &mut Renderer, alias: Option<&str>) {
    if let Some(alias) = alias {
        r.sql.push_str(" AS ");
        r.push_ident(alias);
    }
}

impl Render for TableFactor {
    fn render(&self, r: &mut Renderer) {
        match self {
            TableFactor::Table { name, alias } => {
                name.render(r);
                render_alias(r, alias.as_deref());
            }
            TableFactor::Derived { subquery, alias } => {
                r.sql.push('(');
                subquery.render(r);
                r.sql.push(')');
                render_alias(r, alias.as_deref());
            }
            TableFactor::NestedJoin { base, joins, alias } => {
                r.sql.push('(');
                base.render(r);
                for join in joins {
                    join.render(r);
                }
                r.sql.push(')');
                render_alias(r, alias.as_deref());
            }
        }
    }
}

impl Render for Join {
    fn render(&self, r: &mut Renderer) {
        let keyword = match self.kind {
            JoinKind::Simple => ", ",
            JoinKind::Cross => " CROSS JOIN ",
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
            JoinKind::Right => " RIGHT JOIN ",
            JoinKind::Full => " FULL JOIN ",
        };
        r.sql.push_str(keyword);
        self.relation.render(r);

        if let Some(on) = self.on_condition() {
            r.sql.push_str(" ON ");
            on.render(r);
        }
    }
}

impl Render for OrderByItem {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        match self.descending {
            Some(true) => r.sql.push_str(" DESC"),
            Some(false) => r.sql.push_str(" ASC"),
            None => {}
        }
    }
}
