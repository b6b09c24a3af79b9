//! FILENAME: core/persistence/src/error.rs

use engine::RowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(RowId),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("The stock table has not been created yet")]
    TableMissing,

    #[error("The stock table already exists")]
    TableExists,

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}
