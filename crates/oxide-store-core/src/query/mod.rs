//! Filter and order builders.
//!
//! [`Filter`] and [`Order`] are separate types so a statement can only ever
//! receive the right kind in each position. When parts arrive through a
//! single channel, [`QueryPart`] carries them as a closed enum and the
//! `TryFrom` conversions reject the wrong kind.

mod filter;
mod order;

pub use filter::{CompareOp, Filter, Fragment};
pub use order::{Order, OrderBy, OrderDirection};

use crate::error::{BuildError, Result};

/// Shared query over both builder kinds.
pub trait Clause {
    /// Returns whether at least one fragment was accumulated.
    fn has_value(&self) -> bool;
}

/// Either kind of builder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPart {
    /// A filter builder.
    Filter(Filter),
    /// An order builder.
    Order(Order),
}

impl Clause for QueryPart {
    fn has_value(&self) -> bool {
        match self {
            Self::Filter(filter) => filter.has_value(),
            Self::Order(order) => order.has_value(),
        }
    }
}

impl From<Filter> for QueryPart {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<Order> for QueryPart {
    fn from(order: Order) -> Self {
        Self::Order(order)
    }
}

impl TryFrom<QueryPart> for Filter {
    type Error = BuildError;

    fn try_from(part: QueryPart) -> Result<Self> {
        match part {
            QueryPart::Filter(filter) => Ok(filter),
            QueryPart::Order(_) => Err(BuildError::InvalidFilterBuilderType),
        }
    }
}

impl TryFrom<QueryPart> for Order {
    type Error = BuildError;

    fn try_from(part: QueryPart) -> Result<Self> {
        match part {
            QueryPart::Order(order) => Ok(order),
            QueryPart::Filter(_) => Err(BuildError::InvalidOrderBuilderType),
        }
    }
}

/// Options of a multi-row select.
///
/// `take` and `skip` of zero mean "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Row filter.
    pub filter: Option<Filter>,
    /// Sort order.
    pub order: Option<Order>,
    /// Maximum number of rows.
    pub take: u64,
    /// Number of rows to skip.
    pub skip: u64,
    /// Columns left out of the select list.
    pub exclude: Vec<String>,
}

impl FindOptions {
    /// Creates options selecting every row and column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from positional filter and order parts.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidFilterBuilderType`] when the filter
    /// position holds an order, and [`BuildError::InvalidOrderBuilderType`]
    /// when the order position holds a filter.
    pub fn from_parts(filter: Option<QueryPart>, order: Option<QueryPart>) -> Result<Self> {
        Ok(Self {
            filter: filter.map(Filter::try_from).transpose()?,
            order: order.map(Order::try_from).transpose()?,
            ..Self::default()
        })
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the order.
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub const fn take(mut self, n: u64) -> Self {
        self.take = n;
        self
    }

    /// Skips rows for pagination.
    #[must_use]
    pub const fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }

    /// Leaves columns out of the select list.
    #[must_use]
    pub fn exclude(mut self, columns: &[&str]) -> Self {
        self.exclude
            .extend(columns.iter().map(|c| (*c).to_string()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_rejects_wrong_kind() {
        let order: QueryPart = Order::new().desc("id").into();
        assert_eq!(
            Filter::try_from(order),
            Err(BuildError::InvalidFilterBuilderType)
        );

        let filter: QueryPart = Filter::new().eq("id", 1).into();
        assert_eq!(
            Order::try_from(filter),
            Err(BuildError::InvalidOrderBuilderType)
        );
    }

    #[test]
    fn test_from_parts() {
        let options = FindOptions::from_parts(
            Some(Filter::new().eq("name", "Peter").into()),
            Some(Order::new().desc("age").into()),
        )
        .unwrap();
        assert!(options.filter.is_some());
        assert!(options.order.is_some());

        let swapped = FindOptions::from_parts(Some(Order::new().into()), None);
        assert_eq!(swapped, Err(BuildError::InvalidFilterBuilderType));

        let swapped = FindOptions::from_parts(None, Some(Filter::new().into()));
        assert_eq!(swapped, Err(BuildError::InvalidOrderBuilderType));
    }

    #[test]
    fn test_query_part_has_value() {
        assert!(!QueryPart::from(Filter::new()).has_value());
        assert!(QueryPart::from(Order::new().asc("id")).has_value());
    }
}
