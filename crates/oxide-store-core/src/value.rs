//! Values and records.
//!
//! Values never end up inlined in SQL text: they travel next to the statement
//! in a [`ParameterSet`](crate::params::ParameterSet) and are bound by the
//! driver.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

/// Format used for every date value handed to the database.
///
/// Fixed width, zero padded, 24-hour clock and no timezone suffix.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Date and time without timezone. Rendered with [`DATE_FORMAT`] when
    /// the value becomes a parameter.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns the value as it is handed to the driver: dates become text,
    /// everything else is unchanged.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::DateTime(dt) => Self::Text(dt.format(DATE_FORMAT).to_string()),
            other => other,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer payload, widening booleans.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns the float payload.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Blob(b) => serde_json::Value::from(b.clone()),
            Self::DateTime(dt) => serde_json::Value::String(dt.format(DATE_FORMAT).to_string()),
        }
    }

    fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Text(s),
            // Nested structures are stored as their JSON text.
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Text(nested.to_string())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Blob(b) => serializer.serialize_bytes(b),
            Self::DateTime(dt) => serializer.collect_str(&dt.format(DATE_FORMAT)),
        }
    }
}

/// Trait for types that can be converted to a [`Value`].
pub trait ToValue {
    /// Converts the value to a `Value`.
    fn to_value(self) -> Value;
}

impl ToValue for Value {
    fn to_value(self) -> Value {
        self
    }
}

impl ToValue for &Value {
    fn to_value(self) -> Value {
        self.clone()
    }
}

impl ToValue for bool {
    fn to_value(self) -> Value {
        Value::Bool(self)
    }
}

impl ToValue for i64 {
    fn to_value(self) -> Value {
        Value::Int(self)
    }
}

impl ToValue for i32 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for i16 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for i8 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for u32 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for u16 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for u8 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for f64 {
    fn to_value(self) -> Value {
        Value::Float(self)
    }
}

impl ToValue for f32 {
    fn to_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl ToValue for String {
    fn to_value(self) -> Value {
        Value::Text(self)
    }
}

impl ToValue for &str {
    fn to_value(self) -> Value {
        Value::Text(String::from(self))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(self) -> Value {
        Value::Blob(self)
    }
}

impl ToValue for &[u8] {
    fn to_value(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(self) -> Value {
        Value::DateTime(self)
    }
}

impl ToValue for NaiveDate {
    fn to_value(self) -> Value {
        Value::DateTime(self.and_time(chrono::NaiveTime::MIN))
    }
}

/// Uses the wall-clock time of the value's own zone; no conversion happens.
impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(self) -> Value {
        Value::DateTime(self.naive_local())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(self) -> Value {
        self.map_or(Value::Null, ToValue::to_value)
    }
}

/// An ordered mapping from column name to value.
///
/// Records are what callers hand to `insert`/`update` and what selects
/// return. Column order is insertion order; setting an existing column
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets a column and returns the record.
    #[must_use]
    pub fn with<V: ToValue>(mut self, column: &str, value: V) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column, replacing any previous value for it.
    pub fn set<V: ToValue>(&mut self, column: &str, value: V) {
        let value = value.to_value();
        if let Some((_, slot)) = self.fields.iter_mut().find(|(name, _)| name == column) {
            *slot = value;
            return;
        }
        self.fields.push((String::from(column), value));
    }

    /// Returns the value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns whether the record has a value for the column.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Removes a column and returns its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(name, _)| name == column)?;
        Some(self.fields.remove(index).1)
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a record from any serializable struct or map.
    ///
    /// Nested arrays and objects are stored as their JSON text.
    ///
    /// # Errors
    ///
    /// Fails when `value` does not serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| (name, Value::from_json(value)))
                .collect()),
            other => Err(serde::ser::Error::custom(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    /// Deserializes the record into a typed struct.
    ///
    /// # Errors
    ///
    /// Fails when the columns do not match the shape of `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.set(&name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use serde::Deserialize;

    #[test]
    fn test_to_value_conversions() {
        assert_eq!(true.to_value(), Value::Bool(true));
        assert_eq!(42_i32.to_value(), Value::Int(42));
        assert_eq!(2.5_f64.to_value(), Value::Float(2.5));
        assert_eq!("hello".to_value(), Value::Text(String::from("hello")));
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(Some(42_i32).to_value(), Value::Int(42));
    }

    #[test]
    fn test_date_is_normalized_to_fixed_width_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap();
        let text = dt.to_value().normalized();
        assert_eq!(text, Value::Text(String::from("2024-03-07 09:05:02")));
        assert_eq!(text.as_str().unwrap().len(), 19);
    }

    #[test]
    fn test_plain_date_renders_midnight() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(
            date.to_value().normalized(),
            Value::Text(String::from("1999-12-31 00:00:00"))
        );
    }

    #[test]
    fn test_zoned_datetime_keeps_wall_clock() {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            dt.to_value().normalized(),
            Value::Text(String::from("2024-01-01 23:30:00"))
        );
    }

    #[test]
    fn test_record_set_replaces_in_place() {
        let mut record = Record::new().with("name", "Peter").with("age", 28);
        record.set("name", "Paul");
        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns, vec!["name", "age"]);
        assert_eq!(record.get("name"), Some(&Value::Text(String::from("Paul"))));
    }

    #[test]
    fn test_record_remove() {
        let mut record = Record::new().with("id", 1).with("name", "x");
        assert_eq!(record.remove("id"), Some(Value::Int(1)));
        assert!(!record.contains("id"));
        assert_eq!(record.len(), 1);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        id: Option<i64>,
        name: String,
        age: i64,
    }

    #[test]
    fn test_record_serde_mapping() {
        let user = User {
            id: None,
            name: String::from("Peter"),
            age: 28,
        };
        let mut record = Record::from_serialize(&user).unwrap();
        assert_eq!(record.get("id"), Some(&Value::Null));
        record.set("id", 7);

        let back: User = record.deserialize().unwrap();
        assert_eq!(back.id, Some(7));
        assert_eq!(back.name, "Peter");
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        assert!(Record::from_serialize(&42).is_err());
    }
}
