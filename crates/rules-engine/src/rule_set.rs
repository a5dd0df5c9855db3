use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Generated rule statements, deduplicated by their rendered text and kept
/// in the order they were first produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<String>,
    seen: HashSet<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, returning `false` if the same text was already present.
    pub fn insert(&mut self, rule: impl Into<String>) -> bool {
        let rule = rule.into();
        if self.seen.contains(&rule) {
            return false;
        }
        self.seen.insert(rule.clone());
        self.rules.push(rule);
        true
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.seen.contains(rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.rules.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.rules
    }
}

impl Extend<String> for RuleSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for rule in iter {
            self.insert(rule);
        }
    }
}

impl FromIterator<String> for RuleSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for RuleSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rules)
    }
}
