//! Statement assembly.
//!
//! [`Assembler`] turns a schema name plus builders and records into SQL text
//! and the parameters it references. Nothing here touches a database; every
//! contract violation (unknown schema, missing primary key) is reported
//! before any SQL exists.

use crate::error::{BuildError, Result};
use crate::params::{normalize_template, placeholder, IntoParameterSet, ParameterSet};
use crate::query::{Clause, Filter, FindOptions, Order};
use crate::schema::{prepare_schema_name, Column, Schema, SchemaRegistry};
use crate::value::{Record, ToValue};

/// SQL text and the parameters it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with `$name` placeholders.
    pub sql: String,
    /// Values for the placeholders.
    pub params: ParameterSet,
}

impl Statement {
    /// Creates a statement from driver-native SQL.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: impl IntoParameterSet) -> Self {
        Self {
            sql: sql.into(),
            params: params.into_parameter_set(),
        }
    }

    /// Creates a statement from a template using `{column}` placeholders.
    #[must_use]
    pub fn raw(template: &str, params: impl IntoParameterSet) -> Self {
        Self::new(normalize_template(template), params)
    }
}

/// Builds statements against the schemas of a registry.
///
/// # Example
///
/// ```rust
/// use oxide_store_core::{Assembler, ColumnDef, Record, Schema, SchemaRegistry};
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register(
///         "users",
///         Schema::new()
///             .column("id", ColumnDef::primary_key().auto_generated())
///             .column("name", ColumnDef::new())
///             .column("age", ColumnDef::new()),
///     )
///     .unwrap();
///
/// let record = Record::new().with("name", "Peter").with("age", 28);
/// let statement = Assembler::new(&registry).insert("users", &record).unwrap();
/// assert_eq!(statement.sql, "INSERT INTO users(name,age) VALUES($name,$age)");
/// ```
#[derive(Debug, Clone)]
pub struct Assembler<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Assembler<'r> {
    /// Creates an assembler over a registry.
    #[must_use]
    pub const fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// `SELECT COUNT(*) AS value FROM <table> [WHERE <filter>]`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas.
    pub fn count(&self, schema: &str, filter: Option<&Filter>) -> Result<Statement> {
        self.registry.lookup(schema)?;
        let mut sql = format!("SELECT COUNT(*) AS value FROM {}", prepare_schema_name(schema));
        let mut params = ParameterSet::new();
        push_where(&mut sql, &mut params, filter);
        Ok(Statement { sql, params })
    }

    /// `SELECT <cols> FROM <table> [WHERE] [ORDER BY] [LIMIT] [OFFSET]`
    ///
    /// Columns appear in registration order, minus `options.exclude`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas.
    pub fn find_all(&self, schema: &str, options: &FindOptions) -> Result<Statement> {
        let definition = self.registry.lookup(schema)?;
        let exclude: Vec<&str> = options.exclude.iter().map(String::as_str).collect();

        let mut sql = select_prefix(schema, definition, &exclude);
        let mut params = ParameterSet::new();
        push_where(&mut sql, &mut params, options.filter.as_ref());
        push_order(&mut sql, options.order.as_ref());
        push_pagination(&mut sql, options.take, options.skip);

        Ok(Statement { sql, params })
    }

    /// Same as [`find_all`](Self::find_all) with `take = n` and `skip = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas.
    pub fn find_top(&self, schema: &str, n: u64, options: &FindOptions) -> Result<Statement> {
        let options = FindOptions {
            take: n,
            skip: 0,
            ..options.clone()
        };
        self.find_all(schema, &options)
    }

    /// `SELECT <cols> FROM <table> WHERE <pk> = $<pk> LIMIT 1`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas and
    /// [`BuildError::PrimaryKeyNotDefined`] when the schema has no key.
    pub fn find_pk<V: ToValue>(&self, schema: &str, pk: V, exclude: &[&str]) -> Result<Statement> {
        let (definition, key) = self.keyed(schema)?;

        let mut sql = select_prefix(schema, definition, exclude);
        sql.push_str(&format!(" WHERE {} = {} LIMIT 1", key.name, placeholder(&key.name)));

        let mut params = ParameterSet::new();
        params.bind(&key.name, pk.to_value());
        Ok(Statement { sql, params })
    }

    /// `INSERT INTO <table>(<cols>) VALUES(<placeholders>)`
    ///
    /// A primary key generated by the database is left out of the column
    /// list. A schema with no insertable column yields `DEFAULT VALUES`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas.
    pub fn insert(&self, schema: &str, record: &Record) -> Result<Statement> {
        let definition = self.registry.lookup(schema)?;
        let table = prepare_schema_name(schema);

        let mut exclude = Vec::new();
        if let Some(key) = definition.primary_key().filter(|key| key.is_auto_generated()) {
            exclude.push(key.name.as_str());
        }
        let columns = column_names(definition, &exclude);

        if columns.is_empty() {
            return Ok(Statement::new(
                format!("INSERT INTO {table} DEFAULT VALUES"),
                ParameterSet::new(),
            ));
        }

        let placeholders: Vec<String> = columns.iter().map(|c| placeholder(c)).collect();
        let sql = format!(
            "INSERT INTO {table}({}) VALUES({})",
            columns.join(","),
            placeholders.join(",")
        );
        Ok(Statement {
            sql,
            params: bind_columns(record, &columns),
        })
    }

    /// `UPDATE <table> SET <col>=$<col>,... WHERE <pk>=$<pk>`
    ///
    /// The key is never part of the `SET` list but is still bound for the
    /// `WHERE` clause.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas,
    /// [`BuildError::PrimaryKeyNotDefined`] when the schema has no key and
    /// [`BuildError::NothingToUpdate`] when the key is its only column.
    pub fn update(&self, schema: &str, record: &Record) -> Result<Statement> {
        let (definition, key) = self.keyed(schema)?;

        let assignments: Vec<String> = column_names(definition, &[key.name.as_str()])
            .iter()
            .map(|c| format!("{c}={}", placeholder(c)))
            .collect();
        if assignments.is_empty() {
            return Err(BuildError::NothingToUpdate(String::from(schema)));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {}={}",
            prepare_schema_name(schema),
            assignments.join(","),
            key.name,
            placeholder(&key.name)
        );

        Ok(Statement {
            sql,
            params: bind_columns(record, &column_names(definition, &[])),
        })
    }

    /// `DELETE FROM <table> WHERE <pk>=$<pk>`
    ///
    /// Only the key value is bound.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaNotDefined`] for unknown schemas and
    /// [`BuildError::PrimaryKeyNotDefined`] when the schema has no key.
    pub fn delete(&self, schema: &str, record: &Record) -> Result<Statement> {
        let (_, key) = self.keyed(schema)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}={}",
            prepare_schema_name(schema),
            key.name,
            placeholder(&key.name)
        );
        Ok(Statement {
            sql,
            params: bind_columns(record, &[key.name.as_str()]),
        })
    }

    /// Resolves a schema that must have a primary key.
    fn keyed(&self, schema: &str) -> Result<(&'r Schema, &'r Column)> {
        let definition = self.registry.lookup(schema)?;
        let key = definition
            .primary_key()
            .ok_or_else(|| BuildError::PrimaryKeyNotDefined(String::from(schema)))?;
        Ok((definition, key))
    }
}

/// Schema columns in order, minus the excluded ones.
fn column_names<'s>(schema: &'s Schema, exclude: &[&str]) -> Vec<&'s str> {
    schema
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| !exclude.contains(name))
        .collect()
}

/// Binds the record's values for the given columns. Columns missing from
/// the record stay unbound.
fn bind_columns(record: &Record, columns: &[&str]) -> ParameterSet {
    let mut params = ParameterSet::new();
    for column in columns {
        if let Some(value) = record.get(column) {
            params.bind(column, value.clone());
        }
    }
    params
}

fn select_prefix(schema: &str, definition: &Schema, exclude: &[&str]) -> String {
    format!(
        "SELECT {} FROM {}",
        column_names(definition, exclude).join(","),
        prepare_schema_name(schema)
    )
}

fn push_where(sql: &mut String, params: &mut ParameterSet, filter: Option<&Filter>) {
    if let Some(filter) = filter.filter(|f| f.has_value()) {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.to_sql());
        params.extend(filter.params().to_parameter_map());
    }
}

fn push_order(sql: &mut String, order: Option<&Order>) {
    let rendered = order.map(Order::to_sql).unwrap_or_default();
    if !rendered.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&rendered);
    }
}

/// Appends `LIMIT`/`OFFSET`. SQLite only accepts `OFFSET` after a `LIMIT`,
/// so a skip without a take uses the unbounded `LIMIT -1`.
fn push_pagination(sql: &mut String, take: u64, skip: u64) {
    match (take, skip) {
        (0, 0) => {}
        (take, 0) => sql.push_str(&format!(" LIMIT {take}")),
        (0, skip) => sql.push_str(&format!(" LIMIT -1 OFFSET {skip}")),
        (take, skip) => sql.push_str(&format!(" LIMIT {take} OFFSET {skip}")),
    }
}
