use crate::{commands::SqlInput, error::CliError};
use catalog::Schema;
use rules_engine::RuleOptions;
use tracing::debug;

/// The statement given inline or read from a file.
pub fn read_sql(input: &SqlInput) -> Result<String, CliError> {
    let sql = match (&input.sql, &input.file) {
        (Some(sql), _) => sql.clone(),
        (None, Some(path)) => {
            debug!("Reading SQL from {path}");
            std::fs::read_to_string(path)?
        }
        (None, None) => String::new(),
    };

    let sql = sql.trim();
    if sql.is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(sql.to_string())
}

pub fn load_schema(path: Option<&str>) -> Result<Option<Schema>, CliError> {
    path.map(Schema::load).transpose().map_err(CliError::from)
}

/// Rule options from a JSON file; defaults when no file is given.
pub fn load_options(path: Option<&str>) -> Result<RuleOptions, CliError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(RuleOptions::from_json(&json)?)
        }
        None => Ok(RuleOptions::default()),
    }
}
