use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Ambiguous column '{column}': found in {}", .relations.join(", "))]
    AmbiguousColumn {
        column: String,
        relations: Vec<String>,
    },

    #[error("Invalid schema definition: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
}
