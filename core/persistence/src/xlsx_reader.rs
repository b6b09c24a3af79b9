//! FILENAME: core/persistence/src/xlsx_reader.rs
//! PURPOSE: Reads one worksheet of an XLSX file as a header row plus records.
//! CONTEXT: Used both for the initial stock import and for supplier uploads.
//! Blank header cells become "Unnamed: N" (N is the zero-based column),
//! repeated headers get ".1", ".2" suffixes, and fully blank rows are dropped.
//! Headers are compared ignoring ASCII case, as SQLite compares column
//! names, and a header spelled like the reserved row id column is suffixed
//! the same way.

use crate::{PersistenceError, SheetData, ROW_ID_COLUMN};
use calamine::{open_workbook, Data, Reader, Xlsx};
use engine::{CellValue, StockRecord};
use std::collections::HashSet;
use std::path::Path;

/// Loads a sheet by name, or the first sheet when `sheet` is None.
pub fn load_xlsx(path: &Path, sheet: Option<&str>) -> Result<SheetData, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|candidate| candidate.as_str() == name)
            .cloned()
            .ok_or_else(|| PersistenceError::SheetNotFound(name.to_string()))?,
        None => sheet_names[0].clone(),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| {
        PersistenceError::InvalidFormat(format!("Sheet '{}' has no header row", sheet_name))
    })?;
    let headers = header_names(header_row);

    let mut data = SheetData::new(sheet_name, headers);
    for row in rows {
        let record: StockRecord = data
            .headers
            .iter()
            .enumerate()
            .map(|(col_idx, header)| {
                let value = row.get(col_idx).map(cell_value).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();

        if !record.is_blank() {
            data.rows.push(record);
        }
    }

    Ok(data)
}

fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen = HashSet::from([ROW_ID_COLUMN.to_ascii_lowercase()]);
    let mut headers = Vec::with_capacity(row.len());

    for (col_idx, cell) in row.iter().enumerate() {
        let text = cell_value(cell).display_value().trim().to_string();
        let base = if text.is_empty() {
            format!("Unnamed: {}", col_idx)
        } else {
            text
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.to_ascii_lowercase()) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        headers.push(name);
    }

    headers
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Text(format!("{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
