//! Row decoding.

use oxide_store_core::{Record, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Decodes a row into a [`Record`], one field per result column.
///
/// SQLite is dynamically typed, so each field is decoded by the storage
/// class of the value actually stored.
pub fn record_from_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => Value::Float(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
                _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        record.set(column.name(), value);
    }
    Ok(record)
}
