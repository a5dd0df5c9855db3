use crate::test_schema;
use rules_engine::{RuleOptions, RuleSet, RulesError, generate};
use std::collections::BTreeSet;

/// Generate rules against the shared test schema, panicking on any error
pub fn rules(sql: &str) -> RuleSet {
    rules_with(sql, &RuleOptions::default())
}

pub fn rules_with(sql: &str, options: &RuleOptions) -> RuleSet {
    let schema = test_schema();
    generate(sql, Some(&schema), options).expect("generate rules")
}

/// Generate rules without any schema, so every column is nullable
pub fn schemaless_rules(sql: &str) -> RuleSet {
    generate(sql, None, &RuleOptions::default()).expect("generate rules")
}

pub fn try_rules(sql: &str) -> Result<RuleSet, RulesError> {
    let schema = test_schema();
    generate(sql, Some(&schema), &RuleOptions::default())
}

/// Assert that the rule set holds exactly `expected`, in any order
pub fn assert_rules(actual: &RuleSet, expected: &[&str]) {
    let actual: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
    let expected: BTreeSet<&str> = expected.iter().copied().collect();
    assert_eq!(actual, expected);
}

/// Number of rules whose text contains `fragment`
pub fn count_containing(rules: &RuleSet, fragment: &str) -> usize {
    rules.iter().filter(|r| r.contains(fragment)).count()
}
