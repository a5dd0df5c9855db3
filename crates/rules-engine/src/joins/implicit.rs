use super::increment::factor_keys;
use crate::exprs::{conjuncts, relations_in, without};
use catalog::NullabilityLookup;
use sql_syntax::ast::{Expr, JoinKind, Select, visitor::subqueries_of};
use std::{collections::BTreeSet, sync::Arc};
use tracing::debug;

/// Promotes WHERE comparisons that relate a comma-joined relation to an
/// earlier one into the ON condition of an explicit INNER join.
///
/// A conjunct qualifies when it is a comparison without sub-queries that
/// reads exactly two relations of this level, the later of which is
/// attached by a comma. Join order is kept as written.
pub fn materialize_implicit_joins(select: &Select, lookup: &dyn NullabilityLookup) -> Select {
    let Some(selection) = &select.selection else {
        return select.clone();
    };
    if !select.joins.iter().any(|j| j.kind == JoinKind::Simple) {
        return select.clone();
    }

    let factor_names: Vec<BTreeSet<String>> = select.factors().map(factor_keys).collect();
    let position_of = |relation: &String| factor_names.iter().position(|names| names.contains(relation));

    let mut attached: Vec<Vec<Arc<Expr>>> = vec![Vec::new(); select.joins.len()];
    let mut moved = Vec::new();

    for conjunct in conjuncts(selection) {
        if !matches!(conjunct.as_ref(), Expr::Comparison { .. }) || !subqueries_of(&conjunct).is_empty() {
            continue;
        }
        let Some(relations) = relations_in(&conjunct, lookup) else {
            continue;
        };
        if relations.len() != 2 {
            continue;
        }
        let Some(mut positions) = relations.iter().map(position_of).collect::<Option<Vec<_>>>() else {
            continue;
        };
        positions.sort_unstable();

        let (earlier, later) = (positions[0], positions[1]);
        if earlier == later {
            continue;
        }
        // Factor 0 is the base relation; factor n > 0 is joins[n - 1]
        let join_index = later - 1;
        if select.joins[join_index].kind != JoinKind::Simple {
            continue;
        }
        attached[join_index].push(conjunct.clone());
        moved.push(conjunct);
    }

    if moved.is_empty() {
        return select.clone();
    }

    let mut result = select.clone();
    for (join, predicates) in result.joins.iter_mut().zip(attached) {
        if let Some(on) = Expr::conjunction(predicates) {
            join.kind = JoinKind::Inner;
            join.on = Some(on);
        }
    }

    // A comma binds looser than JOIN, so a comma item in front of an
    // explicit join would hide earlier relations from its ON condition.
    if let Some(last) = result.joins.iter().rposition(|j| !j.kind.is_unconditioned()) {
        for join in &mut result.joins[..last] {
            if join.kind == JoinKind::Simple {
                join.kind = JoinKind::Cross;
            }
        }
    }

    result.selection = without(selection, &moved);
    debug!("Materialized {} implicit join predicate(s)", moved.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Scope;
    use sql_syntax::{ast::Query, parse};

    fn materialize(sql: &str) -> String {
        let query = parse(sql).unwrap();
        let select = query.as_select().unwrap();
        let scope = Scope::new(select, None, None);
        Query::from_select(materialize_implicit_joins(select, &scope)).to_string()
    }

    #[test]
    fn test_comma_join_becomes_inner_join() {
        assert_eq!(
            materialize("SELECT * FROM a, b WHERE a.id = b.id"),
            "SELECT * FROM a INNER JOIN b ON a.id = b.id"
        );
    }

    #[test]
    fn test_remaining_conditions_stay_in_where() {
        assert_eq!(
            materialize("SELECT * FROM a, b, c WHERE a.x = 1 AND c.k = a.k AND b.id = a.id"),
            "SELECT * FROM a INNER JOIN b ON b.id = a.id INNER JOIN c ON c.k = a.k WHERE a.x = 1"
        );
    }

    #[test]
    fn test_unrelated_comma_item_before_explicit_join_is_crossed() {
        assert_eq!(
            materialize("SELECT * FROM a, b, c WHERE c.k = a.k"),
            "SELECT * FROM a CROSS JOIN b INNER JOIN c ON c.k = a.k"
        );
    }

    #[test]
    fn test_non_qualifying_predicates_are_left_alone() {
        let sql = "SELECT * FROM a, b WHERE a.id = b.id OR a.x = 1";
        assert_eq!(materialize(sql), sql);

        let sql = "SELECT * FROM a, b WHERE a.id IN (SELECT b.id FROM c)";
        assert_eq!(materialize(sql), sql);

        let sql = "SELECT * FROM a JOIN b ON a.k = b.k WHERE a.id = b.id";
        assert_eq!(materialize(sql), sql.replace("JOIN", "INNER JOIN"));
    }
}
