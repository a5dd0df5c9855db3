use catalog::SchemaError;
use sql_syntax::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}
