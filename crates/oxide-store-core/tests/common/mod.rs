#![allow(dead_code)]

use oxide_store_core::{Assembler, SchemaRegistry, Statement, Value};

pub const SCHEMAS: &str = r#"{
    "users": {
        "id": { "primaryKey": true, "autoGenerateOnInsert": true },
        "name": {},
        "age": {}
    },
    "posts": {
        "slug": { "primaryKey": true },
        "title": {},
        "body": {},
        "published_at": {}
    },
    "audit": {
        "event": {},
        "at": {}
    }
}"#;

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::from_json(SCHEMAS)
        .unwrap_or_else(|e| panic!("Failed to load schemas: {e}"))
}

pub fn assemble<F>(build: F) -> Statement
where
    F: FnOnce(Assembler<'_>) -> oxide_store_core::Result<Statement>,
{
    let registry = registry();
    build(Assembler::new(&registry)).unwrap_or_else(|e| panic!("Failed to assemble: {e}"))
}

pub fn param<'a>(statement: &'a Statement, placeholder: &str) -> &'a Value {
    statement
        .params
        .get(placeholder)
        .unwrap_or_else(|| panic!("Missing parameter {placeholder} in {}", statement.sql))
}
