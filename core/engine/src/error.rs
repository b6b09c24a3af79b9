//! FILENAME: core/engine/src/error.rs

use crate::schema::ColumnType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Column '{column}' expects type {expected}. Invalid value: '{value}'")]
    InvalidCellValue {
        column: String,
        expected: ColumnType,
        value: String,
    },

    #[error("{0} must not be empty")]
    EmptyField(String),

    #[error("Invalid quantity multiplier: '{0}'")]
    InvalidMultiplier(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Code column '{0}' not found")]
    MissingCodeColumn(String),

    #[error("Nothing to undo")]
    NoPendingAction,

    #[error("No cell is being edited")]
    NoActiveEdit,
}
