//! # oxide-store
//!
//! Async SQLite record store.
//!
//! [`Database`] pairs a [`SchemaRegistry`](oxide_store_core::SchemaRegistry)
//! with a lazily opened sqlx connection. Statements are assembled by
//! `oxide-store-core`; this crate binds their named parameters, runs them
//! and decodes rows into [`Record`](oxide_store_core::Record)s.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_store::{Database, DatabaseOptions};
//! use oxide_store_core::{Filter, FindOptions, Order, SchemaRegistry};
//!
//! # async fn demo() -> oxide_store::Result<()> {
//! let registry = SchemaRegistry::from_json(
//!     r#"{ "users": { "id": { "primaryKey": true, "autoGenerateOnInsert": true },
//!                     "name": {}, "age": {} } }"#,
//! )?;
//! let db = Database::open(DatabaseOptions::from_env()?, registry);
//!
//! let adults = db
//!     .find_all(
//!         "users",
//!         &FindOptions::new()
//!             .filter(Filter::new().gte("age", 18))
//!             .order(Order::new().desc("age"))
//!             .take(20),
//!     )
//!     .await?;
//! println!("{} adults", adults.len());
//! # Ok(())
//! # }
//! ```

mod bind;
pub mod config;
mod connection;
mod database;
mod error;
mod row;

pub use bind::{check_bound, Prepared};
pub use config::{DatabaseOptions, OpenMode};
pub use connection::{Connection, ExecuteResult};
pub use database::Database;
pub use error::{OrmError, Result};
