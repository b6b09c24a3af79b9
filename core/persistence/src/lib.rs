//! FILENAME: core/persistence/src/lib.rs
//! Stockbook Persistence Module
//!
//! Stores the stock table and KOD aliases in an embedded SQLite database,
//! and reads and writes stock sheets in XLSX format.

mod database;
mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use database::{Database, ALIAS_TABLE, META_TABLE, RECORD_TABLE, ROW_ID_COLUMN};
pub use error::PersistenceError;
pub use xlsx_reader::load_xlsx;
pub use xlsx_writer::save_xlsx;

use engine::{StockRecord, StockTable, Upload};

/// Default sheet name used on export.
pub const EXPORT_SHEET_NAME: &str = "Stock";

// ============================================================================
// SHEET DATA
// ============================================================================

/// A header row plus data rows, as read from or written to a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<StockRecord>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Snapshot of the stock table in column and row id order.
    pub fn from_table(table: &StockTable) -> Self {
        let headers = table.schema().column_names();
        let rows = table
            .rows()
            .iter()
            .map(|row| row.record.project(&headers))
            .collect();
        Self {
            name: EXPORT_SHEET_NAME.to_string(),
            headers,
            rows,
        }
    }

    pub fn into_upload(self) -> Upload {
        Upload::new(self.headers, self.rows)
    }
}
