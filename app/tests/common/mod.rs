//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for session integration tests.

#![allow(dead_code)]

use engine::{CellValue, RowId};
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use stockbook_lib::{AppConfig, Session};
use tempfile::TempDir;

/// Sample stock sheet: KOD, PAKET, YER, MİKTAR.
pub const STOCK_HEADERS: [&str; 4] = ["KOD", "PAKET", "YER", "MİKTAR"];

/// Test harness owning a temporary directory and a session whose database
/// lives inside it.
pub struct TestHarness {
    pub dir: TempDir,
    pub session: Session,
}

impl TestHarness {
    /// Create a harness with an empty database (no stock table yet).
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let session = Session::open(Self::config_for(&dir)).unwrap();
        TestHarness { dir, session }
    }

    /// Create a harness with the sample stock imported.
    pub fn with_stock() -> Self {
        let mut harness = Self::new();
        let path = harness.write_xlsx(
            "stock.xlsx",
            &STOCK_HEADERS,
            &[
                stock_row("A1", "0805", "R1", 5.0),
                stock_row("B2", "SOT23", "R2", 10.0),
                stock_row("C3", "0603", "R3", 0.0),
            ],
        );
        harness.session.import_stock(&path, None).unwrap();
        harness
    }

    pub fn config_for(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.path = dir.path().join("stock.db");
        config.logging.path = dir.path().join("stock.log");
        config
    }

    /// Close the session and open the same database again.
    pub fn reopen(&mut self) {
        self.session = Session::open(Self::config_for(&self.dir)).unwrap();
    }

    /// Write a single-sheet XLSX fixture into the temp directory.
    pub fn write_xlsx(&self, name: &str, headers: &[&str], rows: &[Vec<CellValue>]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (idx, row) in rows.iter().enumerate() {
            let r = (idx + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                let c = col as u16;
                match value {
                    CellValue::Empty => {}
                    CellValue::Number(n) => {
                        sheet.write_number(r, c, *n).unwrap();
                    }
                    CellValue::Text(s) => {
                        sheet.write_string(r, c, s).unwrap();
                    }
                    CellValue::Boolean(b) => {
                        sheet.write_boolean(r, c, *b).unwrap();
                    }
                }
            }
        }

        workbook.save(&path).unwrap();
        path
    }

    /// Write a Value/Qty upload file and stage it in the session.
    pub fn stage_upload(&mut self, rows: &[(&str, CellValue)]) -> usize {
        let rows: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|(value, qty)| vec![CellValue::text(*value), qty.clone()])
            .collect();
        let path = self.write_xlsx("upload.xlsx", &["Value", "Qty"], &rows);
        self.session.load_upload(&path, None).unwrap()
    }

    pub fn row_id_of(&self, code: &str) -> Option<RowId> {
        let table = self.session.table().unwrap();
        let schema = table.schema();
        table
            .rows()
            .iter()
            .find(|row| schema.code_of(&row.record).as_deref() == Some(code))
            .map(|row| row.row_id)
    }

    pub fn value_of(&self, code: &str, column: &str) -> Option<CellValue> {
        let row_id = self.row_id_of(code)?;
        let table = self.session.table().unwrap();
        table.row(row_id)?.record.get(column).cloned()
    }

    pub fn quantity_of(&self, code: &str) -> Option<f64> {
        self.value_of(code, "MİKTAR").and_then(|v| v.as_number())
    }

    pub fn row_count(&self) -> usize {
        self.session.table().unwrap().len()
    }
}

pub fn stock_row(code: &str, paket: &str, yer: &str, qty: f64) -> Vec<CellValue> {
    vec![
        CellValue::text(code),
        CellValue::text(paket),
        CellValue::text(yer),
        CellValue::Number(qty),
    ]
}

pub fn qty(n: f64) -> CellValue {
    CellValue::Number(n)
}
