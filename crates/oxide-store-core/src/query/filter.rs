//! Filter builder.
//!
//! A [`Filter`] is an ordered sequence of fragments that renders verbatim
//! into the body of a `WHERE` clause. The builder never reorders or
//! simplifies what the caller assembled: connectives and parentheses come out
//! exactly where they were put in.

use std::fmt;

use crate::params::{placeholder, Params};
use crate::value::ToValue;

use super::Clause;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Pattern match (LIKE)
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
        }
    }
}

/// One token of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// `column op $placeholder`
    Comparison {
        /// Column name.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Placeholder the value is bound to.
        placeholder: String,
    },
    /// `column IS NULL` / `column IS NOT NULL`
    Null {
        /// Column name.
        column: String,
        /// Whether the check is `IS NOT NULL`.
        negated: bool,
    },
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `NOT`
    Not,
    /// `(`
    Open,
    /// `)`
    Close,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison {
                column,
                op,
                placeholder,
            } => write!(f, "{column} {op} {placeholder}"),
            Self::Null {
                column,
                negated: false,
            } => write!(f, "{column} IS NULL"),
            Self::Null {
                column,
                negated: true,
            } => write!(f, "{column} IS NOT NULL"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Not => write!(f, "NOT"),
            Self::Open => write!(f, "("),
            Self::Close => write!(f, ")"),
        }
    }
}

/// Accumulates filter fragments together with the values they bind.
///
/// # Example
///
/// ```rust
/// use oxide_store_core::Filter;
///
/// let filter = Filter::new()
///     .eq("status", "active")
///     .and()
///     .open()
///     .gt("age", 18)
///     .or()
///     .eq("verified", true)
///     .close();
///
/// assert_eq!(
///     filter.to_sql(),
///     "status = $status AND ( age > $age OR verified = $verified )"
/// );
/// assert_eq!(filter.params().len(), 3);
/// ```
///
/// A column compared more than once gets numbered placeholders
/// (`$age`, `$age_2`, ...). Numbering skips names already bound, so each
/// comparison keeps its own value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fragments: Vec<Fragment>,
    params: Params,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value`.
    #[must_use]
    pub fn eq<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Eq, value)
    }

    /// Adds `column != value`.
    #[must_use]
    pub fn ne<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Ne, value)
    }

    /// Adds `column > value`.
    #[must_use]
    pub fn gt<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Gt, value)
    }

    /// Adds `column >= value`.
    #[must_use]
    pub fn gte<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Gte, value)
    }

    /// Adds `column < value`.
    #[must_use]
    pub fn lt<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Lt, value)
    }

    /// Adds `column <= value`.
    #[must_use]
    pub fn lte<V: ToValue>(self, column: &str, value: V) -> Self {
        self.compare(column, CompareOp::Lte, value)
    }

    /// Adds `column LIKE pattern`. Use `%` for wildcard matching.
    #[must_use]
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.compare(column, CompareOp::Like, pattern)
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn is_null(mut self, column: &str) -> Self {
        self.fragments.push(Fragment::Null {
            column: String::from(column),
            negated: false,
        });
        self
    }

    /// Adds `column IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(mut self, column: &str) -> Self {
        self.fragments.push(Fragment::Null {
            column: String::from(column),
            negated: true,
        });
        self
    }

    /// Adds `AND`.
    #[must_use]
    pub fn and(mut self) -> Self {
        self.fragments.push(Fragment::And);
        self
    }

    /// Adds `OR`.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.fragments.push(Fragment::Or);
        self
    }

    /// Adds `NOT`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.fragments.push(Fragment::Not);
        self
    }

    /// Opens a parenthesized group.
    #[must_use]
    pub fn open(mut self) -> Self {
        self.fragments.push(Fragment::Open);
        self
    }

    /// Closes a parenthesized group.
    #[must_use]
    pub fn close(mut self) -> Self {
        self.fragments.push(Fragment::Close);
        self
    }

    /// Adds a comparison and binds its value.
    #[must_use]
    pub fn compare<V: ToValue>(mut self, column: &str, op: CompareOp, value: V) -> Self {
        let name = self.unbound_name(column);
        self.params.add(&name, value);
        self.fragments.push(Fragment::Comparison {
            column: String::from(column),
            op,
            placeholder: placeholder(&name),
        });
        self
    }

    /// First of `column`, `column_2`, `column_3`, ... not yet bound.
    fn unbound_name(&self, column: &str) -> String {
        let mut name = String::from(column);
        let mut n = 1;
        while self.params.get(&name).is_some() {
            n += 1;
            name = format!("{column}_{n}");
        }
        name
    }

    /// Returns the fragments in insertion order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Returns the values bound by the comparisons.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Renders the `WHERE` body: fragments joined by single spaces.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl Clause for Filter {
    fn has_value(&self) -> bool {
        !self.fragments.is_empty()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{fragment}")?;
        }
        Ok(())
    }
}
