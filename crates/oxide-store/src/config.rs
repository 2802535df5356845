//! Database configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::{OrmError, Result};

/// Path that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Default database file.
pub const DEFAULT_PATH: &str = "db.sqlite3";

/// How the database file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read-only; the file must exist.
    ReadOnly,
    /// Read-write; the file must exist.
    ReadWrite,
    /// Read-write, creating the file if missing.
    #[default]
    ReadWriteCreate,
}

impl OpenMode {
    /// Returns whether writes are refused.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// Returns whether a missing file is created.
    #[must_use]
    pub const fn creates(self) -> bool {
        matches!(self, Self::ReadWriteCreate)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read_only"),
            Self::ReadWrite => write!(f, "read_write"),
            Self::ReadWriteCreate => write!(f, "read_write_create"),
        }
    }
}

impl FromStr for OpenMode {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ro" | "read_only" | "readonly" => Ok(Self::ReadOnly),
            "rw" | "read_write" | "readwrite" => Ok(Self::ReadWrite),
            "rwc" | "read_write_create" | "create" => Ok(Self::ReadWriteCreate),
            other => Err(OrmError::Config(format!("unknown open mode: {other}"))),
        }
    }
}

/// Options for opening a database.
///
/// # Example
///
/// ```rust
/// use oxide_store::{DatabaseOptions, OpenMode};
///
/// let options = DatabaseOptions::new("app.db")
///     .mode(OpenMode::ReadWrite)
///     .verbose(true);
/// assert!(options.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Database file, or [`MEMORY_PATH`].
    pub path: PathBuf,
    /// Open mode.
    pub mode: OpenMode,
    /// Whether trace and profile subscribers are notified.
    pub verbose: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PATH)
    }
}

impl DatabaseOptions {
    /// Creates options for a database file with the default mode.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: OpenMode::default(),
            verbose: false,
        }
    }

    /// Creates options for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Reads options from `DATABASE_PATH`, `DATABASE_MODE` and
    /// `DATABASE_VERBOSE`. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] for unparseable values.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            options.path = PathBuf::from(path);
        }
        if let Ok(mode) = std::env::var("DATABASE_MODE") {
            options.mode = mode.parse()?;
        }
        if let Ok(verbose) = std::env::var("DATABASE_VERBOSE") {
            options.verbose = parse_flag(&verbose)?;
        }
        Ok(options)
    }

    /// Sets the open mode.
    #[must_use]
    pub const fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables trace and profile notifications.
    #[must_use]
    pub const fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Returns whether the options select an in-memory database.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }

    pub(crate) fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = if self.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new().filename(&self.path)
        };
        Ok(options
            .read_only(self.mode.is_read_only())
            .create_if_missing(self.mode.creates()))
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(OrmError::Config(format!("not a boolean: {other}"))),
    }
}
