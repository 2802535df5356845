//! # oxide-store-core
//!
//! Statement assembly for a small SQLite record store.
//!
//! This crate provides:
//! - [`SchemaRegistry`] holding ordered column definitions per table
//! - [`Params`] / [`ParameterSet`] for `$column` named parameters
//! - [`Filter`] and [`Order`] builders rendering `WHERE` and `ORDER BY`
//! - [`Assembler`] producing count, select, insert, update and delete
//!   statements
//!
//! Nothing in this crate performs I/O. The `oxide-store` crate executes the
//! resulting [`Statement`]s.
//!
//! ## Example
//!
//! ```rust
//! use oxide_store_core::{
//!     Assembler, ColumnDef, Filter, FindOptions, Order, Schema, SchemaRegistry,
//! };
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
//! let options = FindOptions::new()
//!     .filter(Filter::new().gt("age", 18))
//!     .order(Order::new().desc("age"))
//!     .take(10);
//!
//! let statement = Assembler::new(&registry).find_all("users", &options).unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT id,name,age FROM users WHERE age > $age ORDER BY age DESC LIMIT 10"
//! );
//! ```

mod error;
pub mod params;
pub mod query;
pub mod schema;
mod statement;
pub mod value;

pub use error::{BuildError, Result};
pub use params::{IntoParameterSet, ParameterSet, Params};
pub use query::{Clause, CompareOp, Filter, FindOptions, Order, OrderDirection, QueryPart};
pub use schema::{Column, ColumnDef, Schema, SchemaRegistry};
pub use statement::{Assembler, Statement};
pub use value::{Record, ToValue, Value, DATE_FORMAT};
