use catalog::SchemaError;
use rules_engine::RulesError;
use sql_syntax::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read or write a file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the SQL statement: {0}")]
    Parse(#[from] ParseError),

    #[error("Schema check failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to generate rules: {0}")]
    Rules(#[from] RulesError),

    #[error("Failed to deserialize the rule options: {0}")]
    ConfigDeserialize(#[from] serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("The input contains no SQL statement")]
    EmptyInput,
}
