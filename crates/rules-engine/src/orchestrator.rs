//! Drives one pass over a query: join rules, WHERE mutations, aggregate
//! rules, HAVING mutations and sub-query rules, in that order.

use crate::{
    aggregate::aggregate_rules,
    joins::{self, materialize_implicit_joins},
    mutator::mutate,
    null_reducer::reduce_asserted_nulls,
    options::RuleOptions,
    rule_set::RuleSet,
};
use catalog::{NullabilityLookup, Schema, Scope};
use sql_syntax::ast::{JoinKind, Query, Select, SetExpr};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, trace, warn};

/// What covering one query produced.
#[derive(Debug, Default)]
pub struct Coverage {
    /// Mutated copies of the covered query itself, deduplicated by text.
    pub variants: Vec<Arc<Query>>,
    /// Independent statements found on the way, such as the rules of
    /// derived tables.
    pub standalone: RuleSet,
    seen: HashSet<String>,
}

impl Coverage {
    pub fn push(&mut self, query: Query) -> bool {
        let sql = query.to_string();
        if !self.seen.insert(sql) {
            return false;
        }
        trace!("Rule: {}", query);
        self.variants.push(Arc::new(query));
        true
    }

    /// Pulls the variants and standalone rules of a branch of a set
    /// operation into this coverage.
    pub fn absorb(&mut self, other: Coverage) {
        for variant in other.variants {
            self.push(Arc::unwrap_or_clone(variant));
        }
        self.standalone.extend(other.standalone);
    }

    /// Rendered variants followed by the standalone rules.
    pub fn into_rules(self) -> RuleSet {
        let mut rules: RuleSet = self.variants.iter().map(|q| q.to_string()).collect();
        rules.extend(self.standalone);
        rules
    }
}

pub struct Generator<'a> {
    pub(crate) schema: Option<&'a Schema>,
    pub(crate) options: &'a RuleOptions,
}

impl<'a> Generator<'a> {
    pub fn new(schema: Option<&'a Schema>, options: &'a RuleOptions) -> Self {
        Generator { schema, options }
    }

    /// Covers a query. `parent` is the scope of the enclosing query for a
    /// correlated sub-select; `depth` counts the sub-select nesting.
    pub fn cover_query(&self, query: &Query, parent: Option<&Scope<'_>>, depth: usize) -> Coverage {
        if depth > self.options.max_subquery_depth {
            warn!(
                "Sub-select nested deeper than {} levels skipped",
                self.options.max_subquery_depth
            );
            return Coverage::default();
        }

        match &query.body {
            SetExpr::Select(select) => self.cover_select(query, select, parent, depth),
            // Each branch stands on its own
            _ => self.cover_set_expr(&query.body, parent, depth),
        }
    }

    fn cover_set_expr(&self, body: &SetExpr, parent: Option<&Scope<'_>>, depth: usize) -> Coverage {
        match body {
            SetExpr::Select(select) => {
                let branch = Query::from_select(select.as_ref().clone());
                self.cover_select(&branch, select, parent, depth)
            }
            SetExpr::Query(inner) => self.cover_query(inner, parent, depth),
            SetExpr::SetOperation { left, right, .. } => {
                let mut coverage = self.cover_set_expr(left, parent, depth);
                coverage.absorb(self.cover_set_expr(right, parent, depth));
                coverage
            }
        }
    }

    /// Covers one SELECT; `query` supplies the ORDER BY / LIMIT tail kept
    /// around the mutated copies.
    fn cover_select(
        &self,
        query: &Query,
        select: &Select,
        parent: Option<&Scope<'_>>,
        depth: usize,
    ) -> Coverage {
        let scope = Scope::new(select, self.schema, parent);
        let sanitized = materialize_implicit_joins(select, &scope);
        let mut coverage = Coverage::default();

        if self.options.join_rules {
            let items = joins::generate(&sanitized, &scope);
            for item in items {
                coverage.push(query.with_select(item.apply(&sanitized)));
            }
        }

        // WHERE and HAVING coverage assumes every join matched
        let matched = matched_joins(&sanitized);
        let mut candidates: Vec<Query> = Vec::new();

        if self.options.where_rules {
            if let Some(selection) = &matched.selection {
                for alternative in mutate(selection, &scope) {
                    candidates.push(query.with_select(Select {
                        selection: Some(alternative),
                        ..matched.clone()
                    }));
                }
            }
        }

        if self.options.aggregate_rules {
            for rule in aggregate_rules(&matched, &scope) {
                candidates.push(if rule.keep_tail {
                    query.with_select(rule.select)
                } else {
                    Query::from_select(rule.select)
                });
            }
        }

        if self.options.having_rules {
            if let Some(having) = &matched.having {
                for alternative in mutate(having, &scope) {
                    candidates.push(query.with_select(Select {
                        having: Some(alternative),
                        ..matched.clone()
                    }));
                }
            }
        }

        debug!("{} WHERE/aggregate/HAVING candidate(s)", candidates.len());
        for candidate in candidates {
            coverage.push(reduce_candidate(candidate, &scope));
        }

        if self.options.subquery_rules {
            self.cover_subqueries(query, &sanitized, &matched, &scope, depth, &mut coverage);
        }

        coverage
    }
}

/// `select` with every conditioned join made INNER.
pub(crate) fn matched_joins(select: &Select) -> Select {
    let mut matched = select.clone();
    for join in &mut matched.joins {
        if !join.kind.is_unconditioned() {
            join.kind = JoinKind::Inner;
        }
    }
    matched
}

/// Strips WHERE and HAVING predicates made dead by the clause's own
/// `col IS NULL` conjuncts.
fn reduce_candidate(mut candidate: Query, lookup: &dyn NullabilityLookup) -> Query {
    if let SetExpr::Select(select) = &mut candidate.body {
        select.selection = select
            .selection
            .as_ref()
            .map(|selection| reduce_asserted_nulls(selection, lookup));
        select.having = select
            .having
            .as_ref()
            .map(|having| reduce_asserted_nulls(having, lookup));
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_syntax::parse;

    fn cover(sql: &str, options: &RuleOptions) -> Vec<String> {
        let query = parse(sql).unwrap();
        Generator::new(None, options)
            .cover_query(&query, None, 0)
            .into_rules()
            .into_vec()
    }

    #[test]
    fn test_where_mutations_keep_the_tail() {
        let rules = cover(
            "SELECT title FROM movies WHERE year = 2003 ORDER BY title LIMIT 5",
            &RuleOptions::default(),
        );
        assert_eq!(
            rules,
            vec![
                "SELECT title FROM movies WHERE year = 2002 ORDER BY title LIMIT 5",
                "SELECT title FROM movies WHERE year = 2003 ORDER BY title LIMIT 5",
                "SELECT title FROM movies WHERE year = 2004 ORDER BY title LIMIT 5",
                "SELECT title FROM movies WHERE year IS NULL ORDER BY title LIMIT 5",
            ]
        );
    }

    #[test]
    fn test_where_mutations_force_inner_joins() {
        let options = RuleOptions {
            join_rules: false,
            ..RuleOptions::default()
        };
        let rules = cover("SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE b.v = 'x'", &options);
        assert_eq!(
            rules,
            vec![
                "SELECT * FROM a INNER JOIN b ON a.id = b.id WHERE b.v = 'x'",
                "SELECT * FROM a INNER JOIN b ON a.id = b.id WHERE NOT (b.v = 'x')",
                "SELECT * FROM a INNER JOIN b ON a.id = b.id WHERE b.v IS NULL",
            ]
        );
    }

    #[test]
    fn test_asserted_nulls_strip_co_predicates() {
        let rules = cover("SELECT * FROM t WHERE a = 1 AND a > 0", &RuleOptions::default());
        assert!(rules.contains(&"SELECT * FROM t WHERE a IS NULL".to_string()));
        assert!(rules.contains(&"SELECT * FROM t WHERE a = 1 AND a = -1".to_string()));
        assert!(!rules.iter().any(|r| r.contains("a IS NULL AND") || r.contains("AND a IS NULL")));
    }

    #[test]
    fn test_options_switch_rule_families_off() {
        let options = RuleOptions {
            where_rules: false,
            aggregate_rules: false,
            ..RuleOptions::default()
        };
        let rules = cover("SELECT k, SUM(v) FROM t WHERE v > 1 GROUP BY k", &options);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_set_operation_branches_are_independent() {
        let rules = cover(
            "SELECT a FROM t WHERE a = 1 UNION ALL (SELECT a FROM u WHERE a = 'x')",
            &RuleOptions::default(),
        );
        assert_eq!(rules.len(), 7);
        assert!(rules.iter().all(|r| !r.contains("UNION")));
        assert!(rules.contains(&"SELECT a FROM u WHERE NOT (a = 'x')".to_string()));
    }
}
