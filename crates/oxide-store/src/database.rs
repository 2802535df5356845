//! Schema-aware statement API.

use std::sync::Arc;

use futures::stream::BoxStream;
use oxide_store_core::{
    Assembler, Filter, FindOptions, IntoParameterSet, Record, SchemaRegistry, Statement, ToValue,
    Value,
};
use tracing::debug;

use crate::bind::Prepared;
use crate::config::DatabaseOptions;
use crate::connection::{Connection, ExecuteResult};
use crate::error::Result;

/// A registry of schemas bound to one lazily opened database.
///
/// Statement methods assemble SQL first, so an unknown schema or a missing
/// primary key fails before the database is touched. Cloning is cheap and
/// shares the connection.
///
/// # Example
///
/// ```rust,no_run
/// use oxide_store::{Database, DatabaseOptions};
/// use oxide_store_core::{ColumnDef, Record, Schema, SchemaRegistry};
///
/// # async fn demo() -> oxide_store::Result<()> {
/// let mut registry = SchemaRegistry::new();
/// registry.register(
///     "users",
///     Schema::new()
///         .column("id", ColumnDef::primary_key().auto_generated())
///         .column("name", ColumnDef::new())
///         .column("age", ColumnDef::new()),
/// )?;
///
/// let db = Database::open(DatabaseOptions::new("app.db"), registry);
/// db.run("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)", ())
///     .await?;
///
/// let mut peter = Record::new().with("name", "Peter").with("age", 28);
/// db.insert("users", &mut peter).await?;
/// assert!(peter.contains("id"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<Connection>,
    registry: Arc<SchemaRegistry>,
}

impl Database {
    /// Creates a database handle. The file is opened on first use.
    #[must_use]
    pub fn open(options: DatabaseOptions, registry: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self {
            connection: Arc::new(Connection::new(options)),
            registry: registry.into(),
        }
    }

    /// Returns the schema registry.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn assembler(&self) -> Assembler<'_> {
        Assembler::new(&self.registry)
    }

    /// Counts rows matching `filter`. No row counts as zero.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas, or the driver error.
    pub async fn count(&self, schema: &str, filter: Option<&Filter>) -> Result<i64> {
        let prepared = Prepared::from_statement(self.assembler().count(schema, filter)?)?;
        let row = self.connection.get(&prepared).await?;
        Ok(row
            .as_ref()
            .and_then(|row| row.get("value"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }

    /// Returns every row matching `options`.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas, or the driver error.
    pub async fn find_all(&self, schema: &str, options: &FindOptions) -> Result<Vec<Record>> {
        let prepared = Prepared::from_statement(self.assembler().find_all(schema, options)?)?;
        self.connection.all(&prepared).await
    }

    /// Returns at most `n` rows matching `options`.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas, or the driver error.
    pub async fn find_top(
        &self,
        schema: &str,
        n: u64,
        options: &FindOptions,
    ) -> Result<Vec<Record>> {
        let prepared = Prepared::from_statement(self.assembler().find_top(schema, n, options)?)?;
        self.connection.all(&prepared).await
    }

    /// Returns the row whose primary key equals `pk`.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas or schemas without a
    /// primary key, or the driver error.
    pub async fn find_pk<V: ToValue + Send>(
        &self,
        schema: &str,
        pk: V,
        exclude: &[&str],
    ) -> Result<Option<Record>> {
        let prepared = Prepared::from_statement(self.assembler().find_pk(schema, pk, exclude)?)?;
        self.connection.get(&prepared).await
    }

    /// Inserts `record` and returns the number of rows changed.
    ///
    /// When the primary key is generated by the database, the new id is
    /// written into `record`. On error the record is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas, an unbound parameter when
    /// the record lacks an inserted column, or the driver error.
    pub async fn insert(&self, schema: &str, record: &mut Record) -> Result<u64> {
        let prepared = Prepared::from_statement(self.assembler().insert(schema, record)?)?;
        let generated = self
            .registry
            .primary_key(schema)?
            .filter(|key| key.is_auto_generated())
            .map(|key| key.name.clone());

        let result = self.connection.execute(&prepared).await?;
        if let Some(key) = generated {
            debug!(schema, key = %key, id = result.last_insert_id, "inserted record");
            record.set(&key, result.last_insert_id);
        }
        Ok(result.changes)
    }

    /// Updates the row identified by the record's primary key.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas or schemas without a
    /// primary key, or the driver error.
    pub async fn update(&self, schema: &str, record: &Record) -> Result<u64> {
        let prepared = Prepared::from_statement(self.assembler().update(schema, record)?)?;
        Ok(self.connection.execute(&prepared).await?.changes)
    }

    /// Deletes the row identified by the record's primary key.
    ///
    /// # Errors
    ///
    /// Returns a build error for unknown schemas or schemas without a
    /// primary key, or the driver error.
    pub async fn delete(&self, schema: &str, record: &Record) -> Result<u64> {
        let prepared = Prepared::from_statement(self.assembler().delete(schema, record)?)?;
        Ok(self.connection.execute(&prepared).await?.changes)
    }

    /// Prepares hand-written SQL. `{column}` placeholders are accepted as
    /// well as `$column`.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error when a placeholder has no value.
    #[allow(clippy::unused_self)]
    pub fn prepare(&self, sql: &str, params: impl IntoParameterSet) -> Result<Prepared> {
        Prepared::from_statement(Statement::raw(sql, params))
    }

    /// Runs hand-written SQL and reports the last insert id and changes.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error or the driver error.
    pub async fn execute(
        &self,
        sql: &str,
        params: impl IntoParameterSet + Send,
    ) -> Result<ExecuteResult> {
        let prepared = self.prepare(sql, params)?;
        self.connection.execute(&prepared).await
    }

    /// Runs hand-written SQL, discarding its outcome.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error or the driver error.
    pub async fn run(&self, sql: &str, params: impl IntoParameterSet + Send) -> Result<()> {
        let prepared = self.prepare(sql, params)?;
        self.connection.run(&prepared).await
    }

    /// Returns the first row of hand-written SQL, if any.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error or the driver error.
    pub async fn get(
        &self,
        sql: &str,
        params: impl IntoParameterSet + Send,
    ) -> Result<Option<Record>> {
        let prepared = self.prepare(sql, params)?;
        self.connection.get(&prepared).await
    }

    /// Returns the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error or the driver error.
    pub async fn scalar(
        &self,
        sql: &str,
        params: impl IntoParameterSet + Send,
    ) -> Result<Option<Value>> {
        let prepared = self.prepare(sql, params)?;
        self.connection.scalar(&prepared).await
    }

    /// Returns every row of hand-written SQL.
    ///
    /// # Errors
    ///
    /// Returns an unbound parameter error or the driver error.
    pub async fn all(
        &self,
        sql: &str,
        params: impl IntoParameterSet + Send,
    ) -> Result<Vec<Record>> {
        let prepared = self.prepare(sql, params)?;
        self.connection.all(&prepared).await
    }

    /// Streams the rows of a prepared statement.
    #[must_use]
    pub fn reader<'a>(&'a self, prepared: &'a Prepared) -> BoxStream<'a, Result<Record>> {
        self.connection.reader(prepared)
    }

    /// Does nothing; see [`Connection::close`].
    pub fn close(&self) {
        self.connection.close();
    }
}
