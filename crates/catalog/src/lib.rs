pub mod errors;
pub mod schema;
pub mod scope;
pub mod validator;

pub use errors::SchemaError;
pub use schema::{ColumnDef, Schema, TableDef};
pub use scope::{NullabilityLookup, Relation, RelationColumns, Resolution, Scope};
pub use validator::validate;
