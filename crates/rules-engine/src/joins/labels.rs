use super::increment::{OuterIncrement, factor_keys};
use sql_syntax::ast::{JoinKind, Select};
use std::collections::BTreeSet;

/// One labelling pass: a kind for every join plus the relations whose
/// rows are NULL-padded under those kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub kinds: Vec<JoinKind>,
    pub missing: BTreeSet<String>,
}

/// Labels `select.joins[outer]` with `kind` and every other conditioned
/// join INNER, then propagates the padded relations forward: a later
/// join whose ON condition reads a padded relation becomes LEFT so the
/// padded rows survive it, and its own relation joins the padded set.
/// Runs until no further join changes.
pub fn propagate(
    select: &Select,
    increments: &[Option<OuterIncrement>],
    outer: usize,
    kind: JoinKind,
    missing: BTreeSet<String>,
) -> Labels {
    let mut kinds: Vec<JoinKind> = select
        .joins
        .iter()
        .map(|join| {
            if join.kind.is_unconditioned() {
                join.kind
            } else {
                JoinKind::Inner
            }
        })
        .collect();
    kinds[outer] = kind;

    let mut missing = missing;
    let mut pending: Vec<usize> = (outer + 1..select.joins.len())
        .filter(|&k| increments[k].is_some())
        .collect();

    loop {
        let before = pending.len();
        pending.retain(|&k| {
            let reads_missing = increments[k]
                .as_ref()
                .and_then(OuterIncrement::referenced_left)
                .is_some_and(|left| !left.is_disjoint(&missing));
            if reads_missing {
                kinds[k] = JoinKind::Left;
                missing.extend(factor_keys(&select.joins[k].relation));
            }
            !reads_missing
        });
        if pending.len() == before {
            break;
        }
    }

    Labels { kinds, missing }
}
