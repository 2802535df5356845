//! The lazily opened SQLite connection.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use oxide_store_core::{Record, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::bind::Prepared;
use crate::config::DatabaseOptions;
use crate::error::{OrmError, Result};
use crate::row::record_from_row;

type TraceHook = Box<dyn Fn(&str) + Send + Sync>;
type ProfileHook = Box<dyn Fn(&str, Duration) + Send + Sync>;

#[derive(Default)]
struct Hooks {
    trace: Vec<TraceHook>,
    profile: Vec<ProfileHook>,
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Rowid of the last inserted row on this connection.
    pub last_insert_id: i64,
    /// Rows changed by the statement.
    pub changes: u64,
}

/// A single cached connection, opened on first use.
///
/// The pool behind it holds at most one connection and never idles it out,
/// so statements are serialized and an in-memory database lives as long as
/// the `Connection`.
pub struct Connection {
    options: DatabaseOptions,
    pool: OnceCell<SqlitePool>,
    hooks: RwLock<Hooks>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection handle. Nothing is opened yet.
    #[must_use]
    pub fn new(options: DatabaseOptions) -> Self {
        Self {
            options,
            pool: OnceCell::new(),
            hooks: RwLock::new(Hooks::default()),
        }
    }

    /// Returns the options the connection was created with.
    #[must_use]
    pub const fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Returns whether the database has been opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pool.initialized()
    }

    /// Subscribes to the SQL text of every executed statement.
    ///
    /// Only fires when the options are verbose.
    pub fn on_trace<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .trace
            .push(Box::new(hook));
    }

    /// Subscribes to the SQL text and elapsed time of every completed
    /// statement.
    ///
    /// Only fires when the options are verbose.
    pub fn on_profile<F>(&self, hook: F)
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .profile
            .push(Box::new(hook));
    }

    /// Opens the database on first call and returns the cached pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened in the configured mode.
    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                debug!(
                    path = %self.options.path.display(),
                    mode = %self.options.mode,
                    "opening database"
                );
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(self.options.connect_options()?)
                    .await?;
                Ok::<_, OrmError>(pool)
            })
            .await
    }

    /// Runs a statement and reports the last insert id and changed rows.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] if the driver rejects the statement.
    pub async fn execute(&self, prepared: &Prepared) -> Result<ExecuteResult> {
        let pool = self.pool().await?;
        let started = self.before(prepared);
        let result = prepared.query().execute(pool).await?;
        self.after(prepared, started);
        Ok(ExecuteResult {
            last_insert_id: result.last_insert_rowid(),
            changes: result.rows_affected(),
        })
    }

    /// Runs a statement, discarding its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] if the driver rejects the statement.
    pub async fn run(&self, prepared: &Prepared) -> Result<()> {
        self.execute(prepared).await.map(|_| ())
    }

    /// Returns the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] if the driver rejects the statement.
    pub async fn get(&self, prepared: &Prepared) -> Result<Option<Record>> {
        let pool = self.pool().await?;
        let started = self.before(prepared);
        let row = prepared.query().fetch_optional(pool).await?;
        self.after(prepared, started);
        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    /// Returns the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] if the driver rejects the statement.
    pub async fn scalar(&self, prepared: &Prepared) -> Result<Option<Value>> {
        let record = self.get(prepared).await?;
        Ok(record.and_then(|record| record.into_iter().next().map(|(_, value)| value)))
    }

    /// Returns every row. Zero matches give an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] if the driver rejects the statement.
    pub async fn all(&self, prepared: &Prepared) -> Result<Vec<Record>> {
        let pool = self.pool().await?;
        let started = self.before(prepared);
        let rows = prepared.query().fetch_all(pool).await?;
        self.after(prepared, started);
        Ok(rows
            .iter()
            .map(record_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Streams rows as they are read.
    ///
    /// Profile hooks fire once the stream is exhausted; a stream dropped
    /// early reports nothing.
    #[must_use]
    pub fn reader<'a>(&'a self, prepared: &'a Prepared) -> BoxStream<'a, Result<Record>> {
        stream::once(self.pool())
            .map_ok(move |pool| {
                let started = self.before(prepared);
                let finished = stream::once(async move {
                    self.after(prepared, started);
                    None::<Result<Record>>
                })
                .filter_map(future::ready);
                prepared
                    .query()
                    .fetch(pool)
                    .map(|row| -> Result<Record> { Ok(record_from_row(&row?)?) })
                    .chain(finished)
            })
            .try_flatten()
            .boxed()
    }

    /// Does nothing.
    ///
    /// The connection stays cached for reuse and is released when the
    /// `Connection` is dropped.
    pub fn close(&self) {
        trace!(path = %self.options.path.display(), "close requested; connection kept");
    }

    fn before(&self, prepared: &Prepared) -> Instant {
        trace!(
            sql = prepared.sql(),
            params = prepared.values().len(),
            "executing statement"
        );
        if self.options.verbose {
            let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
            for hook in &hooks.trace {
                hook(prepared.source());
            }
        }
        Instant::now()
    }

    fn after(&self, prepared: &Prepared, started: Instant) {
        if self.options.verbose {
            let elapsed = started.elapsed();
            let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
            for hook in &hooks.profile {
                hook(prepared.source(), elapsed);
            }
        }
    }
}
