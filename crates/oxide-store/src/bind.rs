//! Binding named parameters to positional SQLite arguments.
//!
//! Statements carry `$name` placeholders and a [`ParameterSet`] keyed by
//! those names. The sqlx SQLite driver binds by position, so each statement
//! is rewritten once: every `$name` outside string literals, quoted
//! identifiers and comments becomes `?`, and the matching value is queued in
//! order of appearance. A name used twice is bound twice.

use oxide_store_core::params::PLACEHOLDER_PREFIX;
use oxide_store_core::{IntoParameterSet, ParameterSet, Statement, Value, DATE_FORMAT};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use crate::error::{OrmError, Result};

/// A statement rewritten for positional binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    source: String,
    sql: String,
    values: Vec<Value>,
}

impl Prepared {
    /// Rewrites `sql` and resolves every placeholder against `params`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnboundParameter`] when the SQL references a
    /// placeholder that has no value.
    pub fn new(sql: &str, params: impl IntoParameterSet) -> Result<Self> {
        let params = params.into_parameter_set();
        let (rewritten, names) = rewrite_placeholders(sql);
        let values = names
            .into_iter()
            .map(|name| {
                params
                    .get(&name)
                    .cloned()
                    .ok_or(OrmError::UnboundParameter(name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: String::from(sql),
            sql: rewritten,
            values,
        })
    }

    /// Prepares an assembled statement.
    ///
    /// # Errors
    ///
    /// See [`Prepared::new`].
    pub fn from_statement(statement: Statement) -> Result<Self> {
        Self::new(&statement.sql, statement.params)
    }

    /// SQL as written, with named placeholders.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// SQL handed to the driver.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values in binding order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.values
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| match value {
                Value::Null => query.bind(Option::<i64>::None),
                Value::Bool(b) => query.bind(*b),
                Value::Int(n) => query.bind(*n),
                Value::Float(f) => query.bind(*f),
                Value::Text(s) => query.bind(s.as_str()),
                Value::Blob(b) => query.bind(b.as_slice()),
                Value::DateTime(dt) => query.bind(dt.format(DATE_FORMAT).to_string()),
            })
    }
}

impl TryFrom<Statement> for Prepared {
    type Error = OrmError;

    fn try_from(statement: Statement) -> Result<Self> {
        Self::from_statement(statement)
    }
}

/// Returns `sql` with each `$name` replaced by `?`, plus the placeholders
/// (including `$`) in order of appearance.
pub fn rewrite_placeholders(sql: &str) -> (String, Vec<String>) {
    let mut scanner = Scanner::new(sql);
    scanner.run();
    (scanner.out, scanner.names)
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    out: String,
    names: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            out: String::with_capacity(input.len()),
            names: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Copies the current character to the output.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.out.push(c);
        Some(c)
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' | '`' => self.copy_quoted(c),
                '[' => self.copy_until(']'),
                '-' if self.peek_next() == Some('-') => self.copy_until('\n'),
                '/' if self.peek_next() == Some('*') => self.copy_block_comment(),
                c if c == PLACEHOLDER_PREFIX && self.peek_next().is_some_and(is_name_char) => {
                    self.take_placeholder();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Copies a quoted literal or identifier. A doubled quote is an escape.
    fn copy_quoted(&mut self, quote: char) {
        self.advance();
        while let Some(c) = self.advance() {
            if c == quote {
                if self.peek() == Some(quote) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
    }

    fn copy_until(&mut self, end: char) {
        self.advance();
        while let Some(c) = self.advance() {
            if c == end {
                break;
            }
        }
    }

    fn copy_block_comment(&mut self) {
        self.advance();
        self.advance();
        while self.peek().is_some() {
            if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn take_placeholder(&mut self) {
        let start = self.pos;
        self.pos += PLACEHOLDER_PREFIX.len_utf8();
        while self.peek().is_some_and(is_name_char) {
            self.pos += self.peek().map_or(0, char::len_utf8);
        }
        self.names.push(String::from(&self.input[start..self.pos]));
        self.out.push('?');
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Checks that every placeholder in `sql` has a value in `params`.
///
/// # Errors
///
/// Returns [`OrmError::UnboundParameter`] for the first missing name.
pub fn check_bound(sql: &str, params: &ParameterSet) -> Result<()> {
    let (_, names) = rewrite_placeholders(sql);
    names
        .into_iter()
        .find(|name| params.get(name).is_none())
        .map_or(Ok(()), |name| Err(OrmError::UnboundParameter(name)))
}
