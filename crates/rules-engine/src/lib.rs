//! MC/DC rule generation for SQL SELECT statements.
//!
//! [`generate`] parses a statement, checks it against an optional schema
//! and returns the mutated statements whose results, compared with the
//! original's, cover the query's conditions, join null semantics,
//! grouping and nested sub-queries.

pub mod aggregate;
pub mod error;
pub mod exprs;
pub mod joins;
pub mod mutator;
pub mod null_reducer;
pub mod options;
pub mod orchestrator;
pub mod rule_set;
pub mod subquery;

pub use error::RulesError;
pub use options::RuleOptions;
pub use orchestrator::{Coverage, Generator};
pub use rule_set::RuleSet;

use catalog::{Schema, validate};
use sql_syntax::{ast::Query, parse};
use tracing::info;

/// Parses `sql`, validates it and generates its rules.
pub fn generate(
    sql: &str,
    schema: Option<&Schema>,
    options: &RuleOptions,
) -> Result<RuleSet, RulesError> {
    let query = parse(sql)?;
    generate_for_query(&query, schema, options)
}

/// Generates the rules of an already parsed query. Schema errors are
/// reported before any rule is generated.
pub fn generate_for_query(
    query: &Query,
    schema: Option<&Schema>,
    options: &RuleOptions,
) -> Result<RuleSet, RulesError> {
    if let Some(schema) = schema {
        validate(query, schema)?;
    }

    let rules = Generator::new(schema, options)
        .cover_query(query, None, 0)
        .into_rules();

    info!("Generated {} rule(s)", rules.len());
    Ok(rules)
}
