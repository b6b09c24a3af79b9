//! FILENAME: core/engine/src/schema.rs
//! PURPOSE: Column descriptors for the dynamic stock table.
//! CONTEXT: The schema is computed once, either inferred from the first
//! imported file or read back from the database's declared column types.
//! Every later edit is validated against it.

use crate::error::EngineError;
use crate::record::StockRecord;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQL type name used when creating the record table.
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Maps a declared SQL type back to a column type.
    /// Unknown declarations are treated as text.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.trim().to_ascii_uppercase();
        if declared.contains("INT") {
            ColumnType::Integer
        } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
            .iter()
            .any(|t| declared.contains(t))
        {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }

    /// Parses user input for a column of this type.
    /// Empty input always yields `Empty`.
    pub fn parse_input(&self, column: &str, input: &str) -> Result<CellValue, EngineError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Empty);
        }

        let invalid = || EngineError::InvalidCellValue {
            column: column.to_string(),
            expected: *self,
            value: input.to_string(),
        };

        match self {
            ColumnType::Integer => trimmed
                .parse::<i64>()
                .map(|n| CellValue::Number(n as f64))
                .map_err(|_| invalid()),
            ColumnType::Real => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(CellValue::Number)
                .ok_or_else(invalid),
            ColumnType::Text => Ok(CellValue::Text(input.to_string())),
        }
    }

    /// Converts an already-typed value (e.g. from a spreadsheet) into the
    /// representation this column stores. Values that cannot be converted
    /// are kept as they are; SQLite's type affinity tolerates them.
    pub fn coerce(&self, value: &CellValue) -> CellValue {
        match (self, value) {
            (_, CellValue::Empty) => CellValue::Empty,
            (ColumnType::Text, CellValue::Number(_)) | (ColumnType::Text, CellValue::Boolean(_)) => {
                CellValue::Text(value.display_value())
            }
            (ColumnType::Integer, CellValue::Text(_)) | (ColumnType::Real, CellValue::Text(_)) => {
                if value.is_empty() {
                    CellValue::Empty
                } else {
                    value.as_number().map(CellValue::Number).unwrap_or_else(|| value.clone())
                }
            }
            _ => value.clone(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered column descriptors plus the name of the code (KOD) column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
    code_column: String,
}

impl Schema {
    /// Builds a schema, forcing the code column to text.
    pub fn new(columns: Vec<ColumnDef>, code_column: impl Into<String>) -> Result<Self, EngineError> {
        let code_column = code_column.into();
        let mut columns = columns;
        match columns.iter_mut().find(|c| c.name == code_column) {
            Some(code) => code.column_type = ColumnType::Text,
            None => return Err(EngineError::MissingCodeColumn(code_column)),
        }
        Ok(Self {
            columns,
            code_column,
        })
    }

    /// Infers column types from imported rows.
    /// A column whose non-empty cells are all integral numbers is `Integer`,
    /// all numbers is `Real`, anything else (or no data at all) is `Text`.
    pub fn infer(
        headers: &[String],
        rows: &[StockRecord],
        code_column: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let columns = headers
            .iter()
            .map(|header| ColumnDef::new(header.clone(), infer_column_type(header, rows)))
            .collect();
        Self::new(columns, code_column)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn code_column(&self) -> &str {
        &self.code_column
    }

    /// Validates editor input for a column.
    pub fn validate_input(&self, column: &str, input: &str) -> Result<CellValue, EngineError> {
        let def = self
            .column(column)
            .ok_or_else(|| EngineError::UnknownColumn(column.to_string()))?;
        def.column_type.parse_input(column, input)
    }

    /// Canonical code of a record: the trimmed text of its code column.
    pub fn code_of(&self, record: &StockRecord) -> Option<String> {
        record.text_of(&self.code_column)
    }

    /// Projects a record onto this schema and coerces every field to its
    /// column type.
    pub fn conform(&self, record: &StockRecord) -> StockRecord {
        self.columns
            .iter()
            .map(|def| {
                let value = record
                    .get(&def.name)
                    .map(|v| def.column_type.coerce(v))
                    .unwrap_or_default();
                (def.name.clone(), value)
            })
            .collect()
    }
}

fn infer_column_type(column: &str, rows: &[StockRecord]) -> ColumnType {
    let mut seen_any = false;
    let mut all_integral = true;

    for value in rows.iter().filter_map(|row| row.get(column)) {
        match value {
            CellValue::Empty => {}
            CellValue::Text(s) if s.trim().is_empty() => {}
            CellValue::Number(n) => {
                seen_any = true;
                if n.fract() != 0.0 {
                    all_integral = false;
                }
            }
            _ => return ColumnType::Text,
        }
    }

    match (seen_any, all_integral) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Real,
    }
}
