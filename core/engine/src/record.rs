//! FILENAME: core/engine/src/record.rs
//! PURPOSE: Defines `StockRecord`, one row of the stock table.
//! CONTEXT: The column set is not fixed at compile time. It comes from the
//! first imported file, so a record is an ordered list of (column, value)
//! pairs rather than a struct. Column order is preserved for display and
//! export; lookups are linear, which is fine for the few dozen columns a
//! stock sheet carries.

use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// Primary key of a row in the record table.
pub type RowId = i64;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StockRecord {
    fields: Vec<(String, CellValue)>,
}

impl StockRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Sets a field, keeping its position if the column already exists.
    /// Returns the previous value.
    pub fn set(&mut self, column: impl Into<String>, value: CellValue) -> Option<CellValue> {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((column, value));
                None
            }
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field is empty (a blank spreadsheet row).
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }

    /// Trimmed display text of a field, or None when the field is missing or blank.
    pub fn text_of(&self, column: &str) -> Option<String> {
        self.get(column)
            .map(|value| value.display_value().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// Builds a record with exactly the given columns, in that order.
    /// Columns this record lacks are filled with `Empty`.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> StockRecord {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                let value = self.get(column).cloned().unwrap_or_default();
                (column.to_string(), value)
            })
            .collect()
    }
}

impl FromIterator<(String, CellValue)> for StockRecord {
    fn from_iter<T: IntoIterator<Item = (String, CellValue)>>(iter: T) -> Self {
        let mut record = StockRecord::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

impl IntoIterator for StockRecord {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
