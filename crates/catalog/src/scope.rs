use crate::{
    errors::SchemaError,
    schema::{Schema, TableDef},
};
use sql_syntax::ast::{ColumnRef, Query, Select, SelectItem, SetExpr, TableFactor};

/// Read-only view of column properties at one query level.
pub trait NullabilityLookup {
    fn is_nullable(&self, column: &ColumnRef) -> bool;

    /// Key of the relation at this level that owns `column`. Outer
    /// references and columns that cannot be attributed yield `None`.
    fn relation_of(&self, column: &ColumnRef) -> Option<String>;

    fn is_unique(&self, _column: &ColumnRef) -> bool {
        false
    }
}

/// Normalised form of a relation name, used as a set key.
pub fn relation_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[derive(Debug, Clone)]
pub enum RelationColumns<'a> {
    Table(&'a TableDef),
    /// Output column names of a derived table
    Derived(Vec<String>),
    /// Anything goes: no schema, or columns that cannot be derived
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Relation<'a> {
    pub name: String,
    pub columns: RelationColumns<'a>,
}

impl Relation<'_> {
    fn has_column(&self, name: &str) -> Option<bool> {
        match &self.columns {
            RelationColumns::Table(def) => Some(def.column(name).is_some()),
            RelationColumns::Derived(names) => {
                Some(names.iter().any(|n| n.eq_ignore_ascii_case(name)))
            }
            RelationColumns::Unknown => None,
        }
    }

    fn resolution(&self, column: &str, depth: usize) -> Resolution {
        let def = match &self.columns {
            RelationColumns::Table(table) => table.column(column),
            _ => None,
        };
        Resolution {
            relation: Some(relation_key(&self.name)),
            depth,
            nullable: def.is_none_or(|c| c.nullable),
            unique: def.is_some_and(|c| c.unique),
        }
    }
}

/// Where a column reference resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub relation: Option<String>,
    /// 0 for the current query level, 1 for its parent, ...
    pub depth: usize,
    pub nullable: bool,
    pub unique: bool,
}

impl Resolution {
    fn unattributed(depth: usize) -> Self {
        Resolution {
            relation: None,
            depth,
            nullable: true,
            unique: false,
        }
    }
}

/// Relations visible to the expressions of one SELECT, chained to the
/// enclosing query's scope for correlated references.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    schema: Option<&'a Schema>,
    relations: Vec<Relation<'a>>,
    aliases: Vec<String>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(select: &Select, schema: Option<&'a Schema>, parent: Option<&'a Scope<'a>>) -> Self {
        let mut relations = Vec::new();
        for factor in select.factors() {
            collect_relations(factor, schema, &mut relations);
        }

        let aliases = select
            .projection
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr {
                    alias: Some(alias), ..
                } => Some(alias.clone()),
                _ => None,
            })
            .collect();

        Scope {
            schema,
            relations,
            aliases,
            parent,
        }
    }

    pub fn relation(&self, name: &str) -> Option<&Relation<'a>> {
        self.relations
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn is_select_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Resolves a column against this scope and then its ancestors; inner
    /// relation names hide outer ones.
    pub fn resolve(&self, column: &ColumnRef) -> Result<Resolution, SchemaError> {
        let mut depth = 0;
        let mut current = Some(self);

        while let Some(scope) = current {
            if let Some(found) = scope.resolve_local(column, depth)? {
                return Ok(found);
            }
            current = scope.parent;
            depth += 1;
        }

        if self.schema.is_none() {
            let mut resolution = Resolution::unattributed(0);
            resolution.relation = column.relation().map(relation_key);
            return Ok(resolution);
        }

        Err(match column.relation() {
            Some(qualifier) => SchemaError::UnknownTable(qualifier.to_string()),
            None => SchemaError::UnknownColumn(column.name.clone()),
        })
    }

    fn resolve_local(
        &self,
        column: &ColumnRef,
        depth: usize,
    ) -> Result<Option<Resolution>, SchemaError> {
        if let Some(qualifier) = column.relation() {
            let Some(relation) = self.relation(qualifier) else {
                return Ok(None);
            };
            if relation.has_column(&column.name) == Some(false) && self.schema.is_some() {
                return Err(SchemaError::UnknownColumn(column.to_string()));
            }
            return Ok(Some(relation.resolution(&column.name, depth)));
        }

        let mut definite = Vec::new();
        let mut opaque = Vec::new();
        for relation in &self.relations {
            match relation.has_column(&column.name) {
                Some(true) => definite.push(relation),
                Some(false) => {}
                None => opaque.push(relation),
            }
        }

        match (definite.as_slice(), opaque.as_slice()) {
            ([only], _) => Ok(Some(only.resolution(&column.name, depth))),
            ([], []) => Ok(None),
            ([], [only]) => Ok(Some(only.resolution(&column.name, depth))),
            ([], _) => Ok(Some(Resolution::unattributed(depth))),
            (many, _) if self.schema.is_some() => Err(SchemaError::AmbiguousColumn {
                column: column.name.clone(),
                relations: many.iter().map(|r| r.name.clone()).collect(),
            }),
            _ => Ok(Some(Resolution::unattributed(depth))),
        }
    }
}

impl NullabilityLookup for Scope<'_> {
    fn is_nullable(&self, column: &ColumnRef) -> bool {
        self.resolve(column).map(|r| r.nullable).unwrap_or(true)
    }

    fn relation_of(&self, column: &ColumnRef) -> Option<String> {
        self.resolve(column)
            .ok()
            .filter(|r| r.depth == 0)
            .and_then(|r| r.relation)
    }

    fn is_unique(&self, column: &ColumnRef) -> bool {
        self.resolve(column).map(|r| r.unique).unwrap_or(false)
    }
}

fn collect_relations<'a>(
    factor: &TableFactor,
    schema: Option<&'a Schema>,
    out: &mut Vec<Relation<'a>>,
) {
    match factor {
        TableFactor::Table { name, alias } => {
            let columns = schema
                .and_then(|s| s.table(name))
                .map(RelationColumns::Table)
                .unwrap_or(RelationColumns::Unknown);
            out.push(Relation {
                name: alias.clone().unwrap_or_else(|| name.base().to_string()),
                columns,
            });
        }
        TableFactor::Derived {
            subquery,
            alias: Some(alias),
        } => out.push(Relation {
            name: alias.clone(),
            columns: derived_columns(subquery)
                .map(RelationColumns::Derived)
                .unwrap_or(RelationColumns::Unknown),
        }),
        TableFactor::Derived { alias: None, .. } => {}
        TableFactor::NestedJoin {
            alias: Some(alias), ..
        } => out.push(Relation {
            name: alias.clone(),
            columns: RelationColumns::Unknown,
        }),
        TableFactor::NestedJoin { base, joins, .. } => {
            collect_relations(base, schema, out);
            for join in joins {
                collect_relations(&join.relation, schema, out);
            }
        }
    }
}

/// Output column names of a derived table, when every item has one.
fn derived_columns(query: &Query) -> Option<Vec<String>> {
    let mut body = &query.body;
    let select = loop {
        match body {
            SetExpr::Select(select) => break select,
            SetExpr::Query(inner) => body = &inner.body,
            SetExpr::SetOperation { left, .. } => body = left,
        }
    };

    select
        .projection
        .iter()
        .map(|item| match item {
            SelectItem::Expr {
                alias: Some(alias), ..
            } => Some(alias.clone()),
            SelectItem::Expr { expr, alias: None } => {
                expr.as_column().map(|column| column.name.clone())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;
    use sql_syntax::parse;

    fn movies_schema() -> Schema {
        Schema {
            tables: vec![
                TableDef::new(
                    "Movies",
                    vec![
                        ColumnDef::not_null("id").unique(),
                        ColumnDef::nullable("title"),
                        ColumnDef::nullable("year"),
                    ],
                ),
                TableDef::new(
                    "Ratings",
                    vec![
                        ColumnDef::not_null("id"),
                        ColumnDef::not_null("movie_id"),
                        ColumnDef::nullable("stars"),
                    ],
                ),
            ],
        }
    }

    fn select_of(sql: &str) -> Select {
        parse(sql).unwrap().as_select().unwrap().clone()
    }

    #[test]
    fn test_resolve_with_schema() {
        let schema = movies_schema();
        let select = select_of("SELECT * FROM Movies m JOIN Ratings r ON m.id = r.movie_id");
        let scope = Scope::new(&select, Some(&schema), None);

        let title = scope.resolve(&ColumnRef::new("title")).unwrap();
        assert_eq!(title.relation.as_deref(), Some("m"));
        assert!(title.nullable);

        let id = scope.resolve(&ColumnRef::qualified("M", "ID")).unwrap();
        assert!(!id.nullable);
        assert!(id.unique);

        assert!(matches!(
            scope.resolve(&ColumnRef::new("id")),
            Err(SchemaError::AmbiguousColumn { .. })
        ));
        assert!(matches!(
            scope.resolve(&ColumnRef::qualified("m", "rating")),
            Err(SchemaError::UnknownColumn(_))
        ));
        assert!(matches!(
            scope.resolve(&ColumnRef::qualified("x", "id")),
            Err(SchemaError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_resolve_without_schema_is_lenient() {
        let single = select_of("SELECT * FROM Movies");
        let scope = Scope::new(&single, None, None);
        let year = scope.resolve(&ColumnRef::new("year")).unwrap();
        assert_eq!(year.relation.as_deref(), Some("movies"));
        assert!(year.nullable);

        let pair = select_of("SELECT * FROM a, b");
        let scope = Scope::new(&pair, None, None);
        assert_eq!(scope.resolve(&ColumnRef::new("x")).unwrap().relation, None);
        assert_eq!(
            scope.relation_of(&ColumnRef::qualified("B", "x")).as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_correlated_reference_resolves_in_parent() {
        let schema = movies_schema();
        let outer = select_of("SELECT * FROM Movies");
        let inner = select_of("SELECT * FROM Ratings");
        let outer_scope = Scope::new(&outer, Some(&schema), None);
        let inner_scope = Scope::new(&inner, Some(&schema), Some(&outer_scope));

        let year = inner_scope.resolve(&ColumnRef::new("year")).unwrap();
        assert_eq!(year.depth, 1);
        assert_eq!(inner_scope.relation_of(&ColumnRef::new("year")), None);
        assert_eq!(
            inner_scope.relation_of(&ColumnRef::new("stars")).as_deref(),
            Some("ratings")
        );
    }

    #[test]
    fn test_inner_relation_shadows_outer() {
        let schema = movies_schema();
        let outer = select_of("SELECT * FROM Movies x");
        let inner = select_of("SELECT * FROM Ratings x");
        let outer_scope = Scope::new(&outer, Some(&schema), None);
        let inner_scope = Scope::new(&inner, Some(&schema), Some(&outer_scope));

        assert!(matches!(
            inner_scope.resolve(&ColumnRef::qualified("x", "title")),
            Err(SchemaError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_derived_table_columns() {
        let schema = movies_schema();
        let select = select_of("SELECT * FROM (SELECT id, year AS y FROM Movies) d");
        let scope = Scope::new(&select, Some(&schema), None);

        assert_eq!(
            scope.resolve(&ColumnRef::new("y")).unwrap().relation.as_deref(),
            Some("d")
        );
        assert!(matches!(
            scope.resolve(&ColumnRef::new("title")),
            Err(SchemaError::UnknownColumn(_))
        ));
    }
}
