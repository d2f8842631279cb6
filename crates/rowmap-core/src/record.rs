//! Record-type metadata.
//!
//! A record type registers an explicit schema description instead of being
//! introspected at runtime: [`Record::columns`] enumerates the column
//! definitions, [`Record::field_value`] maps a storage name to the field's
//! current value, and [`Record::from_row`] materializes an instance from a
//! result row.

use serde::Serialize;

use crate::column::ColumnSchema;
use crate::error::{ComposeError, Result};
use crate::value::{Bindings, SqlValue};

/// A persistable record type.
///
/// Composite (slice/map/struct) fields should surface as their canonical
/// JSON text via [`json_field`]; byte-sequence fields pass through as raw
/// text instead of being serialized.
pub trait Record: Sized {
    /// Column definitions in declaration order.
    fn columns() -> Vec<ColumnSchema>;

    /// Current value of the field stored under `column`.
    ///
    /// `None` when the record has no such column.
    fn field_value(&self, column: &str) -> Result<Option<SqlValue>>;

    /// Named bindings for every column, keyed by storage name.
    fn bindings(&self) -> Result<Bindings> {
        let mut out = Bindings::new();
        for column in Self::columns() {
            if let Some(value) = self.field_value(&column.name)? {
                out.insert(column.name, value);
            }
        }
        Ok(out)
    }

    /// Materializes a record from a result row keyed by storage name.
    ///
    /// A row-shape mismatch is a failure, not silently ignored.
    fn from_row(row: &Bindings) -> Result<Self>;
}

/// Serializes a composite field value to its canonical JSON text.
pub fn json_field<T: Serialize>(column: &str, value: &T) -> Result<SqlValue> {
    serde_json::to_string(value)
        .map(SqlValue::Text)
        .map_err(|source| ComposeError::FieldSerialize {
            column: column.to_string(),
            source,
        })
}

/// Reads a required integer column from a result row.
pub fn row_i64(row: &Bindings, column: &str) -> Result<i64> {
    required(row, column)?
        .as_i64()
        .ok_or_else(|| ComposeError::RowTypeMismatch {
            column: column.to_string(),
        })
}

/// Reads a required text column from a result row.
pub fn row_text(row: &Bindings, column: &str) -> Result<String> {
    required(row, column)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| ComposeError::RowTypeMismatch {
            column: column.to_string(),
        })
}

fn required<'a>(row: &'a Bindings, column: &str) -> Result<&'a SqlValue> {
    row.get(column).ok_or_else(|| ComposeError::RowColumnMissing {
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_field() {
        let mut value = BTreeMap::new();
        value.insert("a", "1");
        value.insert("b", "2");
        assert_eq!(
            json_field("m", &value).unwrap(),
            SqlValue::Text(String::from(r#"{"a":"1","b":"2"}"#))
        );
    }

    #[test]
    fn test_json_field_list() {
        assert_eq!(
            json_field("l", &[1, 2, 3]).unwrap(),
            SqlValue::Text(String::from("[1,2,3]"))
        );
        assert_eq!(
            json_field("l", &Vec::<i32>::new()).unwrap(),
            SqlValue::Text(String::from("[]"))
        );
    }

    #[test]
    fn test_row_readers() {
        let mut row = Bindings::new();
        row.insert("id".into(), SqlValue::Int(7));
        row.insert("name".into(), SqlValue::Text("x".into()));
        assert_eq!(row_i64(&row, "id").unwrap(), 7);
        assert_eq!(row_text(&row, "name").unwrap(), "x");
        assert!(matches!(
            row_i64(&row, "missing").unwrap_err(),
            ComposeError::RowColumnMissing { .. }
        ));
        assert!(matches!(
            row_i64(&row, "name").unwrap_err(),
            ComposeError::RowTypeMismatch { .. }
        ));
    }
}
