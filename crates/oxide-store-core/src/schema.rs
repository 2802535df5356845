//! Schema definitions and the schema registry.
//!
//! A schema is an ordered list of columns for one table. Column order is
//! significant: it is the order in which columns appear in every generated
//! `SELECT`, `INSERT` and `UPDATE`.
//!
//! ```rust
//! use oxide_store_core::{ColumnDef, Schema, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         "users",
//!         Schema::new()
//!             .column("id", ColumnDef::primary_key().auto_generated())
//!             .column("name", ColumnDef::new())
//!             .column("age", ColumnDef::new()),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.primary_key("users").unwrap().unwrap().name, "id");
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{BuildError, Result};

/// Leading character marking a schema name that carries a routing prefix.
pub const SCHEMA_MARKER: char = '~';

/// Separator ending the routing prefix of a marked schema name.
pub const SCHEMA_SEPARATOR: char = '/';

/// Strips the routing prefix from a schema name.
///
/// Names starting with [`SCHEMA_MARKER`] lose everything up to and including
/// the first [`SCHEMA_SEPARATOR`]. Other names, and marked names without a
/// separator, are returned unchanged.
///
/// ```rust
/// use oxide_store_core::schema::prepare_schema_name;
///
/// assert_eq!(prepare_schema_name("~admin/users"), "users");
/// assert_eq!(prepare_schema_name("users"), "users");
/// ```
#[must_use]
pub fn prepare_schema_name(name: &str) -> &str {
    name.strip_prefix(SCHEMA_MARKER)
        .and_then(|rest| rest.split_once(SCHEMA_SEPARATOR))
        .map_or(name, |(_, table)| table)
}

/// Column flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ColumnDef {
    /// Whether the column is the table's primary key.
    #[serde(rename = "primaryKey")]
    pub primary_key: bool,
    /// Whether the database generates the value on insert.
    #[serde(rename = "autoGenerateOnInsert")]
    pub auto_generate: bool,
}

impl ColumnDef {
    /// A plain column.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            primary_key: false,
            auto_generate: false,
        }
    }

    /// A primary-key column.
    #[must_use]
    pub const fn primary_key() -> Self {
        Self {
            primary_key: true,
            auto_generate: false,
        }
    }

    /// Marks the value as generated by the database on insert.
    #[must_use]
    pub const fn auto_generated(mut self) -> Self {
        self.auto_generate = true;
        self
    }
}

/// A named column of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column flags.
    pub def: ColumnDef,
}

impl Column {
    /// Returns whether this is the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.def.primary_key
    }

    /// Returns whether the database generates this column on insert.
    #[must_use]
    pub const fn is_auto_generated(&self) -> bool {
        self.def.auto_generate
    }
}

/// An ordered set of columns describing one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Appends a column. Redefining a column replaces its flags and keeps
    /// its position.
    #[must_use]
    pub fn column(mut self, name: &str, def: ColumnDef) -> Self {
        self.push(String::from(name), def);
        self
    }

    fn push(&mut self, name: String, def: ColumnDef) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.def = def;
            return;
        }
        self.columns.push(Column { name, def });
    }

    /// Returns the columns in registration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the primary-key column, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key())
    }

    fn primary_key_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_primary_key()).count()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to column definitions")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((name, def)) = map.next_entry::<String, ColumnDef>()? {
                    schema.push(name, def);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Holds every schema known to the application.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a registry from JSON.
    ///
    /// The document maps schema names to column maps:
    ///
    /// ```json
    /// { "users": { "id": { "primaryKey": true, "autoGenerateOnInsert": true },
    ///              "name": {} } }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidSchema`] for malformed JSON and
    /// [`BuildError::DuplicatePrimaryKey`] for schemas with two keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let schemas: HashMap<String, Schema> =
            serde_json::from_str(json).map_err(|e| BuildError::InvalidSchema(e.to_string()))?;

        let mut registry = Self::new();
        for (name, schema) in schemas {
            registry.register(&name, schema)?;
        }
        Ok(registry)
    }

    /// Registers a schema under its prepared name, replacing any previous
    /// definition.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePrimaryKey`] when the schema declares
    /// more than one primary-key column.
    pub fn register(&mut self, name: &str, schema: Schema) -> Result<()> {
        let name = prepare_schema_name(name);
        if schema.primary_key_count() > 1 {
            return Err(BuildError::DuplicatePrimaryKey {
                schema: String::from(name),
            });
        }
        self.schemas.insert(String::from(name), schema);
        Ok(())
    }

    /// Looks up a schema.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown names.
    pub fn lookup(&self, name: &str) -> Result<&Schema> {
        self.schemas
            .get(prepare_schema_name(name))
            .ok_or_else(|| BuildError::SchemaNotDefined(String::from(name)))
    }

    /// Returns the primary-key column of a schema, if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown names.
    pub fn primary_key(&self, name: &str) -> Result<Option<&Column>> {
        Ok(self.lookup(name)?.primary_key())
    }

    /// Returns whether a schema is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(prepare_schema_name(name))
    }

    /// Returns the number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns whether no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Schema {
        Schema::new()
            .column("id", ColumnDef::primary_key().auto_generated())
            .column("name", ColumnDef::new())
            .column("age", ColumnDef::new())
    }

    #[test]
    fn test_prepare_schema_name() {
        assert_eq!(prepare_schema_name("~api/users"), "users");
        assert_eq!(prepare_schema_name("~api/v1/users"), "v1/users");
        assert_eq!(prepare_schema_name("users"), "users");
        assert_eq!(prepare_schema_name("api/users"), "api/users");
        assert_eq!(prepare_schema_name("~users"), "~users");
        assert_eq!(prepare_schema_name("~/users"), "users");
    }

    #[test]
    fn test_lookup_uses_prepared_name() {
        let mut registry = SchemaRegistry::new();
        registry.register("~admin/users", users()).unwrap();
        assert!(registry.lookup("users").is_ok());
        assert!(registry.lookup("~public/users").is_ok());
        assert!(registry.contains("users"));
    }

    #[test]
    fn test_lookup_unknown_schema() {
        let registry = SchemaRegistry::new();
        assert_eq!(
            registry.lookup("ghosts"),
            Err(BuildError::SchemaNotDefined(String::from("ghosts")))
        );
    }

    #[test]
    fn test_primary_key() {
        let mut registry = SchemaRegistry::new();
        registry.register("users", users()).unwrap();
        registry
            .register("logs", Schema::new().column("line", ColumnDef::new()))
            .unwrap();

        let pk = registry.primary_key("users").unwrap().unwrap();
        assert_eq!(pk.name, "id");
        assert!(pk.is_auto_generated());
        assert!(registry.primary_key("logs").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_primary_key_rejected() {
        let mut registry = SchemaRegistry::new();
        let schema = Schema::new()
            .column("a", ColumnDef::primary_key())
            .column("b", ColumnDef::primary_key());
        assert_eq!(
            registry.register("pairs", schema),
            Err(BuildError::DuplicatePrimaryKey {
                schema: String::from("pairs")
            })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_redefined_column_keeps_position() {
        let schema = users().column("id", ColumnDef::primary_key());
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert!(!schema.primary_key().unwrap().is_auto_generated());
    }

    #[test]
    fn test_from_json_preserves_column_order() {
        let registry = SchemaRegistry::from_json(
            r#"{
                "users": {
                    "name": {},
                    "id": { "primaryKey": true, "autoGenerateOnInsert": true },
                    "age": {},
                    "created": { "autoGenerateOnInsert": false }
                }
            }"#,
        )
        .unwrap();

        let schema = registry.lookup("users").unwrap();
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "id", "age", "created"]);
        assert_eq!(schema.primary_key().unwrap().name, "id");
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            SchemaRegistry::from_json("{ not json"),
            Err(BuildError::InvalidSchema(_))
        ));
        assert!(matches!(
            SchemaRegistry::from_json(
                r#"{ "t": { "a": { "primaryKey": true }, "b": { "primaryKey": true } } }"#
            ),
            Err(BuildError::DuplicatePrimaryKey { .. })
        ));
    }
}
