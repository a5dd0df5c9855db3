use catalog::{NullabilityLookup, scope::relation_key};
use sql_syntax::ast::{ColumnRef, Expr, Select, TableFactor, visitor::columns_of};
use std::{collections::BTreeSet, sync::Arc};

/// Which side of an outer increment had no column of its own in the ON
/// condition and was filled in from the relations around the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesized {
    None,
    Left,
    Right,
    /// Constant ON condition: neither side is referenced.
    Both,
}

/// The outer increment of one join: the relations and columns its ON
/// condition reads on either side of the joined relation.
#[derive(Debug, Clone)]
pub struct OuterIncrement {
    pub on: Arc<Expr>,
    /// Relations of the accumulated left side
    pub loi: BTreeSet<String>,
    /// Relations of the joined factor
    pub roi: BTreeSet<String>,
    pub loi_columns: Vec<ColumnRef>,
    pub roi_columns: Vec<ColumnRef>,
    pub synthesized: Synthesized,
}

impl OuterIncrement {
    /// Computes the increment of `select.joins[index]`. Unconditioned joins
    /// have none.
    pub fn compute(select: &Select, index: usize, lookup: &dyn NullabilityLookup) -> Option<Self> {
        let join = &select.joins[index];
        let on = join.on_condition()?.clone();

        let left_names: BTreeSet<String> = select
            .factors()
            .take(index + 1)
            .flat_map(factor_keys)
            .collect();
        let right_names = factor_keys(&join.relation);

        let mut loi = BTreeSet::new();
        let mut roi = BTreeSet::new();
        let mut loi_columns = Vec::new();
        let mut roi_columns = Vec::new();

        for column in columns_of(&on) {
            // Outer references and unattributed columns belong to neither side
            let Some(relation) = lookup.relation_of(&column) else {
                continue;
            };
            if right_names.contains(&relation) {
                roi.insert(relation);
                push_distinct(&mut roi_columns, column);
            } else if left_names.contains(&relation) {
                loi.insert(relation);
                push_distinct(&mut loi_columns, column);
            }
        }

        let synthesized = match (loi.is_empty(), roi.is_empty()) {
            (false, false) => Synthesized::None,
            (true, false) => Synthesized::Left,
            (false, true) => Synthesized::Right,
            (true, true) => Synthesized::Both,
        };
        if loi.is_empty() {
            loi = left_names;
        }
        if roi.is_empty() {
            roi = right_names;
        }

        Some(OuterIncrement {
            on,
            loi,
            roi,
            loi_columns,
            roi_columns,
            synthesized,
        })
    }

    /// Left relations the ON condition really reads; `None` when the left
    /// side was synthesized.
    pub fn referenced_left(&self) -> Option<&BTreeSet<String>> {
        match self.synthesized {
            Synthesized::Left | Synthesized::Both => None,
            _ => Some(&self.loi),
        }
    }

    pub fn has_left_columns(&self) -> bool {
        !self.loi_columns.is_empty()
    }

    pub fn has_right_columns(&self) -> bool {
        !self.roi_columns.is_empty()
    }

    /// Every column the ON condition reads at this level.
    pub fn tracked_columns(&self) -> Vec<ColumnRef> {
        self.loi_columns
            .iter()
            .chain(&self.roi_columns)
            .cloned()
            .collect()
    }
}

/// Relation keys exposed by a FROM factor.
pub fn factor_keys(factor: &TableFactor) -> BTreeSet<String> {
    factor
        .exposed_names()
        .iter()
        .map(|name| relation_key(name))
        .collect()
}

fn push_distinct(columns: &mut Vec<ColumnRef>, column: ColumnRef) {
    if !columns.iter().any(|c| c.to_string() == column.to_string()) {
        columns.push(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Scope;
    use sql_syntax::parse;

    fn increments(sql: &str) -> Vec<Option<OuterIncrement>> {
        let query = parse(sql).unwrap();
        let select = query.as_select().unwrap();
        let scope = Scope::new(select, None, None);
        (0..select.joins.len())
            .map(|i| OuterIncrement::compute(select, i, &scope))
            .collect()
    }

    #[test]
    #[should_panic(expected = "without an ON condition")]
    fn test_inner_join_stripped_of_its_condition_is_a_bug() {
        let query = parse("SELECT * FROM a JOIN b ON a.id = b.id").unwrap();
        let mut select = query.as_select().unwrap().clone();
        select.joins[0].on = None;
        let scope = Scope::new(&select, None, None);
        OuterIncrement::compute(&select, 0, &scope);
    }

    #[test]
    fn test_two_sided_condition() {
        let incs = increments("SELECT * FROM a JOIN b ON a.id = b.id AND a.k = b.k AND a.id > 0");
        let inc = incs[0].as_ref().unwrap();
        assert_eq!(inc.synthesized, Synthesized::None);
        assert_eq!(inc.loi.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(inc.roi.iter().collect::<Vec<_>>(), vec!["b"]);

        let loi: Vec<String> = inc.loi_columns.iter().map(|c| c.to_string()).collect();
        assert_eq!(loi, vec!["a.id", "a.k"]);
    }

    #[test]
    fn test_one_sided_conditions_synthesize_the_other_side() {
        let incs = increments("SELECT * FROM a JOIN b ON a.x = 1 LEFT JOIN c ON c.y = 2 JOIN d ON 1 = 1");

        let first = incs[0].as_ref().unwrap();
        assert_eq!(first.synthesized, Synthesized::Right);
        assert!(first.roi.contains("b"));
        assert!(!first.has_right_columns());

        let second = incs[1].as_ref().unwrap();
        assert_eq!(second.synthesized, Synthesized::Left);
        assert_eq!(second.loi.len(), 2);
        assert!(second.referenced_left().is_none());

        assert_eq!(incs[2].as_ref().unwrap().synthesized, Synthesized::Both);
    }

    #[test]
    fn test_comma_joins_have_no_increment() {
        let incs = increments("SELECT * FROM a, b CROSS JOIN c");
        assert!(incs.iter().all(Option::is_none));
    }

    #[test]
    fn test_nested_join_exposes_inner_relations() {
        let incs = increments("SELECT * FROM a JOIN (b JOIN c ON b.k = c.k) ON a.id = c.id");
        let inc = incs[0].as_ref().unwrap();
        assert_eq!(inc.roi.iter().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(inc.synthesized, Synthesized::None);
    }
}
