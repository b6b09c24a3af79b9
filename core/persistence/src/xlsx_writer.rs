//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::{PersistenceError, SheetData};
use engine::CellValue;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::Path;

const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

/// Writes a sheet as a bold header row followed by one row per record.
pub fn save_xlsx(sheet: &SheetData, path: &Path) -> Result<(), PersistenceError> {
    if sheet.headers.len() > MAX_COLUMNS {
        return Err(PersistenceError::InvalidFormat(format!(
            "{} columns exceed the XLSX limit of {}",
            sheet.headers.len(),
            MAX_COLUMNS
        )));
    }
    if sheet.rows.len() + 1 > MAX_ROWS {
        return Err(PersistenceError::InvalidFormat(format!(
            "{} rows exceed the XLSX limit of {}",
            sheet.rows.len(),
            MAX_ROWS - 1
        )));
    }

    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    let header_format = Format::new().set_bold();
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (idx, record) in sheet.rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, header) in sheet.headers.iter().enumerate() {
            let col = col as u16;
            match record.get(header) {
                None | Some(CellValue::Empty) => {}
                Some(CellValue::Number(n)) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Some(CellValue::Text(s)) => {
                    worksheet.write_string(row, col, s)?;
                }
                Some(CellValue::Boolean(b)) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
            }
        }
    }

    xlsx.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_xlsx;
    use engine::StockRecord;
    use tempfile::TempDir;

    fn record(code: &str, qty: CellValue) -> StockRecord {
        let mut record = StockRecord::new();
        record.set("KOD", CellValue::text(code));
        record.set("MİKTAR", qty);
        record
    }

    #[test]
    fn test_written_sheet_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stock.xlsx");
        let mut sheet = SheetData::new("Stock", vec!["KOD".to_string(), "MİKTAR".to_string()]);
        sheet.rows.push(record("A1", CellValue::Number(5.0)));
        sheet.rows.push(record("B2", CellValue::Empty));

        save_xlsx(&sheet, &path).unwrap();
        let loaded = load_xlsx(&path, None).unwrap();

        assert_eq!(loaded.name, "Stock");
        assert_eq!(loaded.headers, sheet.headers);
        assert_eq!(loaded.rows, sheet.rows);
    }

    #[test]
    fn test_blank_rows_skipped_and_sheet_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.xlsx");
        let mut sheet = SheetData::new("Parts", vec!["KOD".to_string(), "MİKTAR".to_string()]);
        sheet.rows.push(record("A1", CellValue::Number(1.0)));
        sheet.rows.push(record("", CellValue::Empty));
        sheet.rows.push(record("C3", CellValue::Number(2.0)));

        save_xlsx(&sheet, &path).unwrap();
        let loaded = load_xlsx(&path, Some("Parts")).unwrap();
        assert_eq!(loaded.rows.len(), 2);

        let missing = load_xlsx(&path, Some("Nope"));
        assert!(matches!(missing, Err(PersistenceError::SheetNotFound(_))));
    }
}
