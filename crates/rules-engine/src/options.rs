use serde::{Deserialize, Serialize};

/// Switches for the individual rule families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub join_rules: bool,
    pub where_rules: bool,
    pub aggregate_rules: bool,
    pub having_rules: bool,
    pub subquery_rules: bool,
    /// Sub-selects nested deeper than this are skipped.
    pub max_subquery_depth: usize,
}

impl Default for RuleOptions {
    fn default() -> Self {
        RuleOptions {
            join_rules: true,
            where_rules: true,
            aggregate_rules: true,
            having_rules: true,
            subquery_rules: true,
            max_subquery_depth: 16,
        }
    }
}

impl RuleOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
