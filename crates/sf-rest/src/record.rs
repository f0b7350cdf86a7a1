//! Decoded records.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

use crate::value::Value;

/// One decoded row: column names paired with typed values.
///
/// Column names are shared between all records of a result set. An absent
/// value (`None`) is a null field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Pair `values` with `columns`. Both must have the same length.
    pub fn new(columns: Arc<[String]>, values: Vec<Option<Value>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Value of a column. Exact name match first, then case-insensitive.
    ///
    /// Returns `None` both for unknown columns and null values; use
    /// [`Record::columns`] to tell them apart.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))?;
        self.values[idx].as_ref()
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_ref))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}
