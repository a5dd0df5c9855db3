#![allow(dead_code)]

use catalog::Schema;

pub mod properties;
pub mod utils;

/// Schema shared by the end-to-end tests. Every column is nullable unless
/// stated otherwise.
const TEST_SCHEMA: &str = r#"{
    "tables": [
        { "name": "Movies", "columns": [
            { "name": "title", "nullable": false },
            { "name": "year" },
            { "name": "length" },
            { "name": "studio" }
        ]},
        { "name": "a", "columns": [
            { "name": "id" }, { "name": "w" }, { "name": "k" }
        ]},
        { "name": "b", "columns": [
            { "name": "id" }, { "name": "v" }, { "name": "aid" }
        ]},
        { "name": "c", "columns": [
            { "name": "id" }, { "name": "bid" }
        ]},
        { "name": "t", "columns": [
            { "name": "a" }, { "name": "b" }, { "name": "k" }
        ]},
        { "name": "u", "columns": [
            { "name": "a" }, { "name": "b" }
        ]},
        { "name": "v", "columns": [
            { "name": "b" }, { "name": "c" }
        ]},
        { "name": "emp", "columns": [
            { "name": "id", "nullable": false, "unique": true },
            { "name": "dept", "nullable": false },
            { "name": "salary" }
        ]}
    ]
}"#;

fn test_schema() -> Schema {
    Schema::from_json(TEST_SCHEMA).expect("test schema")
}
