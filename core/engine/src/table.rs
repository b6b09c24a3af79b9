//! FILENAME: core/engine/src/table.rs
//! PURPOSE: In-memory snapshot of the stock table.
//! CONTEXT: The session reloads a `StockTable` from the database after every
//! write. The comparison engine reads it through a `CodeIndex` and never
//! writes to it; writes travel back to the database as `RowWrite`s.

use crate::record::{RowId, StockRecord};
use crate::schema::Schema;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub row_id: RowId,
    pub record: StockRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockTable {
    schema: Schema,
    /// Rows in ascending row id order.
    rows: Vec<StockRow>,
}

impl StockTable {
    pub fn new(schema: Schema, mut rows: Vec<StockRow>) -> Self {
        rows.sort_by_key(|row| row.row_id);
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[StockRow] {
        &self.rows
    }

    pub fn row(&self, row_id: RowId) -> Option<&StockRow> {
        self.rows
            .binary_search_by_key(&row_id, |row| row.row_id)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of rows by canonical code.
    pub fn code_index(&self) -> CodeIndex<'_> {
        let mut by_code = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            if let Some(code) = self.schema.code_of(&row.record) {
                // First (lowest row id) occurrence of a code is the match target.
                by_code.entry(code).or_insert(row);
            }
        }
        CodeIndex { by_code }
    }
}

/// Rows of a table keyed by their trimmed code.
#[derive(Debug)]
pub struct CodeIndex<'a> {
    by_code: HashMap<String, &'a StockRow>,
}

impl<'a> CodeIndex<'a> {
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&'a StockRow> {
        self.by_code.get(code).copied()
    }

    /// The code as stored in the table. A code absent from the index is
    /// matched ignoring case when exactly one stored code fits.
    pub fn stored_spelling(&self, code: &str) -> Option<String> {
        if self.by_code.contains_key(code) {
            return Some(code.to_string());
        }
        let mut candidates = self
            .by_code
            .keys()
            .filter(|stored| stored.to_lowercase() == code.to_lowercase());
        match (candidates.next(), candidates.next()) {
            (Some(stored), None) => Some(stored.clone()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// A pending write produced by the comparison engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RowWrite {
    Update { row_id: RowId, record: StockRecord },
    Insert { record: StockRecord },
}
