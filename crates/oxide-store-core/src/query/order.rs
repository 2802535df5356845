//! Order builder.
//!
//! Only descending directives produce SQL text. Ascending is SQLite's
//! default for `ORDER BY` terms, so ascending directives are recorded but
//! render as nothing.

use std::fmt;

use super::Clause;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending directive.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending directive.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses a field name; a leading `-` means descending.
    ///
    /// Example: `"-created_at"` for descending, `"name"` for ascending.
    #[must_use]
    pub fn parse(field: &str) -> Self {
        field
            .strip_prefix('-')
            .map_or_else(|| Self::asc(field), Self::desc)
    }
}

/// Accumulates sort directives.
///
/// ```rust
/// use oxide_store_core::Order;
///
/// let order = Order::new().desc("created_at").asc("name").desc("id");
/// assert_eq!(order.to_sql(), "created_at DESC, id DESC");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    directives: Vec<OrderBy>,
}

impl Order {
    /// Creates an empty order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ascending directive.
    #[must_use]
    pub fn asc(mut self, column: &str) -> Self {
        self.directives.push(OrderBy::asc(column));
        self
    }

    /// Adds a descending directive.
    #[must_use]
    pub fn desc(mut self, column: &str) -> Self {
        self.directives.push(OrderBy::desc(column));
        self
    }

    /// Adds a directive from a field name; a leading `-` means descending.
    #[must_use]
    pub fn by(mut self, field: &str) -> Self {
        self.directives.push(OrderBy::parse(field));
        self
    }

    /// Returns the directives in insertion order.
    #[must_use]
    pub fn directives(&self) -> &[OrderBy] {
        &self.directives
    }

    /// Renders the `ORDER BY` body. Empty when every directive ascends.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl Clause for Order {
    fn has_value(&self) -> bool {
        !self.directives.is_empty()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for directive in &self.directives {
            if directive.direction == OrderDirection::Asc {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{} DESC", directive.column)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_only_rendering() {
        let order = Order::new().desc("age");
        assert_eq!(order.to_sql(), "age DESC");
    }

    #[test]
    fn test_ascending_contributes_nothing() {
        let order = Order::new().asc("name");
        assert!(order.has_value());
        assert_eq!(order.to_sql(), "");

        let mixed = Order::new().asc("name").desc("age").asc("id").desc("score");
        assert_eq!(mixed.to_sql(), "age DESC, score DESC");
    }

    #[test]
    fn test_order_by_parsing() {
        assert_eq!(OrderBy::parse("-created_at").direction, OrderDirection::Desc);
        assert_eq!(OrderBy::parse("-created_at").column, "created_at");
        assert_eq!(OrderBy::parse("name").direction, OrderDirection::Asc);

        let order = Order::new().by("-created_at").by("name");
        assert_eq!(order.directives().len(), 2);
        assert_eq!(order.to_sql(), "created_at DESC");
    }
}
