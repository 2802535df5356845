//! Named parameters.
//!
//! Every value in a generated statement is referenced through a named
//! placeholder of the form `$<column>`. [`Params`] accumulates values by
//! column name; [`ParameterSet`] is the rendered, placeholder-keyed form the
//! driver consumes.

use crate::value::{Record, ToValue, Value};

/// Prefix of every named placeholder.
pub const PLACEHOLDER_PREFIX: char = '$';

/// Returns the placeholder for a column (`$<column>`).
#[must_use]
pub fn placeholder(column: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{column}")
}

/// Rewrites `{column}` placeholders of a hand-written SQL template into
/// driver-native `$column` tokens.
///
/// Each `{` becomes `$` and its matching `}` is dropped. Nothing else is
/// touched, and no values are substituted.
///
/// ```rust
/// use oxide_store_core::params::normalize_template;
///
/// assert_eq!(
///     normalize_template("SELECT * FROM users WHERE name = {name}"),
///     "SELECT * FROM users WHERE name = $name"
/// );
/// ```
#[must_use]
pub fn normalize_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut open = 0usize;
    for c in template.chars() {
        match c {
            '{' => {
                open += 1;
                out.push(PLACEHOLDER_PREFIX);
            }
            '}' if open > 0 => open -= 1,
            _ => out.push(c),
        }
    }
    out
}

/// Accumulates `(column, value)` pairs for one statement.
///
/// ```rust
/// use oxide_store_core::{Params, Value};
///
/// let mut params = Params::new();
/// params.add("name", "Peter").add("age", 28);
///
/// let map = params.to_parameter_map();
/// assert_eq!(map.get("$age"), Some(&Value::Int(28)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a value for a column. A second value for the same column
    /// replaces the first one.
    pub fn add<V: ToValue>(&mut self, column: &str, value: V) -> &mut Self {
        let value = value.to_value();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| name == column) {
            *slot = value;
            return self;
        }
        self.entries.push((String::from(column), value));
        self
    }

    /// Adds a value and returns the builder.
    #[must_use]
    pub fn with<V: ToValue>(mut self, column: &str, value: V) -> Self {
        self.add(column, value);
        self
    }

    /// Returns the raw value added for a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the placeholder-keyed parameter set.
    #[must_use]
    pub fn to_parameter_map(&self) -> ParameterSet {
        self.entries
            .iter()
            .map(|(column, value)| (column.as_str(), value.clone()))
            .collect()
    }
}

/// Placeholder-keyed parameters ready for the driver.
///
/// Keys include the `$` prefix. Values are normalized: dates are already
/// rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Value)>,
}

impl ParameterSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds a column's value under its placeholder.
    pub fn bind(&mut self, column: &str, value: Value) {
        let key = placeholder(column);
        let value = value.normalized();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| *name == key) {
            *slot = value;
            return;
        }
        self.entries.push((key, value));
    }

    /// Returns the value bound to a placeholder (including its `$`).
    #[must_use]
    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == placeholder)
            .map(|(_, value)| value)
    }

    /// Iterates over `(placeholder, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the placeholders in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another set into this one; later values win.
    pub fn extend(&mut self, other: Self) {
        for (key, value) in other.entries {
            if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| *name == key) {
                *slot = value;
                continue;
            }
            self.entries.push((key, value));
        }
    }
}

impl<'a> FromIterator<(&'a str, Value)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (column, value) in iter {
            set.bind(column, value);
        }
        set
    }
}

/// Anything that can supply the parameters of a statement.
///
/// A pre-built [`Params`] and a bare [`Record`] normalize to the same
/// [`ParameterSet`]; `None` and `()` give an empty set.
pub trait IntoParameterSet {
    /// Converts into a placeholder-keyed parameter set.
    fn into_parameter_set(self) -> ParameterSet;
}

impl IntoParameterSet for ParameterSet {
    fn into_parameter_set(self) -> ParameterSet {
        self
    }
}

impl IntoParameterSet for &ParameterSet {
    fn into_parameter_set(self) -> ParameterSet {
        self.clone()
    }
}

impl IntoParameterSet for Params {
    fn into_parameter_set(self) -> ParameterSet {
        self.to_parameter_map()
    }
}

impl IntoParameterSet for &Params {
    fn into_parameter_set(self) -> ParameterSet {
        self.to_parameter_map()
    }
}

impl IntoParameterSet for Record {
    fn into_parameter_set(self) -> ParameterSet {
        let mut set = ParameterSet::new();
        for (column, value) in self {
            set.bind(&column, value);
        }
        set
    }
}

impl IntoParameterSet for &Record {
    fn into_parameter_set(self) -> ParameterSet {
        self.iter()
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }
}

impl<T: IntoParameterSet> IntoParameterSet for Option<T> {
    fn into_parameter_set(self) -> ParameterSet {
        self.map_or_else(ParameterSet::new, IntoParameterSet::into_parameter_set)
    }
}

impl IntoParameterSet for () {
    fn into_parameter_set(self) -> ParameterSet {
        ParameterSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_keys_are_prefixed() {
        let params = Params::new().with("name", "Peter").with("age", 28);
        let map = params.to_parameter_map();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["$name", "$age"]);
        assert_eq!(map.get("$name"), Some(&Value::Text(String::from("Peter"))));
        assert_eq!(map.get("name"), None);
    }

    #[test]
    fn test_dates_are_formatted() {
        let joined = NaiveDate::from_ymd_opt(2023, 11, 5)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap();
        let map = Params::new().with("joined", joined).to_parameter_map();
        assert_eq!(
            map.get("$joined"),
            Some(&Value::Text(String::from("2023-11-05 14:03:09")))
        );
    }

    #[test]
    fn test_add_replaces_previous_value() {
        let mut params = Params::new();
        params.add("age", 1).add("age", 2);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("age"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_record_and_builder_normalize_identically() {
        let record = Record::new().with("name", "Peter").with("age", 28);
        let params = Params::new().with("name", "Peter").with("age", 28);
        assert_eq!(
            (&record).into_parameter_set(),
            params.into_parameter_set()
        );
        assert_eq!(record.clone().into_parameter_set(), (&record).into_parameter_set());
    }

    #[test]
    fn test_absent_input_is_empty() {
        assert!(None::<Record>.into_parameter_set().is_empty());
        assert!(().into_parameter_set().is_empty());
    }

    #[test]
    fn test_normalize_template() {
        assert_eq!(normalize_template("{col}"), "$col");
        assert_eq!(
            normalize_template("UPDATE t SET a = {a} WHERE id = {id}"),
            "UPDATE t SET a = $a WHERE id = $id"
        );
        assert_eq!(normalize_template("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_normalize_template_keeps_unmatched_braces() {
        assert_eq!(normalize_template("a } b {c}"), "a } b $c");
    }

    #[test]
    fn test_extend_overrides() {
        let mut set = Params::new().with("a", 1).to_parameter_map();
        set.extend(Params::new().with("a", 2).with("b", 3).to_parameter_map());
        assert_eq!(set.get("$a"), Some(&Value::Int(2)));
        assert_eq!(set.len(), 2);
    }
}
