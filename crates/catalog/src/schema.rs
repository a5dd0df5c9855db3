use crate::errors::SchemaError;
use serde::{Deserialize, Serialize};
use sql_syntax::ast::ObjectName;
use std::path::Path;
use tracing::info;

/// Table structures the engine consults for nullability and name checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name, optionally prefixed with its schema (`public.movies`).
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
}

fn default_nullable() -> bool {
    true
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let schema = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "Loaded schema with {} table(s) from {}",
            schema.tables.len(),
            path.display()
        );
        Ok(schema)
    }

    /// Looks a table up by name, with or without its schema prefix.
    pub fn table(&self, name: &ObjectName) -> Option<&TableDef> {
        let full = name.0.join(".");
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&full))
            .or_else(|| self.tables.iter().find(|t| t.base_name().eq_ignore_ascii_case(name.base())))
    }
}

impl TableDef {
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        TableDef {
            name: name.to_string(),
            columns,
        }
    }

    /// Name without the schema prefix.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

impl ColumnDef {
    pub fn nullable(name: &str) -> Self {
        ColumnDef {
            name: name.to_string(),
            nullable: true,
            unique: false,
        }
    }

    pub fn not_null(name: &str) -> Self {
        ColumnDef {
            name: name.to_string(),
            nullable: false,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
