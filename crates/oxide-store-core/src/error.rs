//! Error types for statement assembly.

use thiserror::Error;

/// Errors raised while resolving schemas or assembling statements.
///
/// These indicate a programming error on the caller's side and are always
/// reported before any SQL reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No schema is registered under the name.
    #[error("schema not defined: {0}")]
    SchemaNotDefined(String),

    /// The operation needs a primary key and the schema has none.
    #[error("primary key not defined for schema: {0}")]
    PrimaryKeyNotDefined(String),

    /// A query part given in the filter position is not a filter.
    #[error("invalid filter builder type")]
    InvalidFilterBuilderType,

    /// A query part given in the order position is not an order.
    #[error("invalid order builder type")]
    InvalidOrderBuilderType,

    /// An update has no column besides the primary key to set.
    #[error("no updatable column in schema: {0}")]
    NothingToUpdate(String),

    /// A schema declares more than one primary-key column.
    #[error("schema '{schema}' declares more than one primary key")]
    DuplicatePrimaryKey {
        /// The offending schema.
        schema: String,
    },

    /// A schema definition could not be parsed.
    #[error("invalid schema definition: {0}")]
    InvalidSchema(String),
}

/// Result type alias for statement assembly.
pub type Result<T> = std::result::Result<T, BuildError>;
