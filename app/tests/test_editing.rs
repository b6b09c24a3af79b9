//! FILENAME: tests/test_editing.rs
//! Integration tests for the table editor, initial import, view and export.

mod common;

use common::{stock_row, TestHarness, STOCK_HEADERS};
use engine::{CellValue, ColumnType, EditState};
use persistence::{load_xlsx, PersistenceError};
use stockbook_lib::AppError;

// ============================================================================
// IMPORT
// ============================================================================

#[test]
fn test_import_infers_schema() {
    let harness = TestHarness::with_stock();
    let schema = harness.session.schema().unwrap();

    assert_eq!(schema.code_column(), "KOD");
    assert_eq!(schema.column("MİKTAR").unwrap().column_type, ColumnType::Integer);
    assert_eq!(schema.column("PAKET").unwrap().column_type, ColumnType::Text);
    assert_eq!(harness.row_count(), 3);
}

#[test]
fn test_second_import_rejected() {
    let mut harness = TestHarness::with_stock();
    let path = harness.write_xlsx("again.xlsx", &STOCK_HEADERS, &[stock_row("X1", "", "", 1.0)]);

    let err = harness.session.import_stock(&path, None).unwrap_err();
    assert!(matches!(err, AppError::Storage(PersistenceError::TableExists)));
    assert_eq!(harness.row_count(), 3);
}

#[test]
fn test_import_without_code_column_rejected() {
    let mut harness = TestHarness::new();
    let path = harness.write_xlsx("nokod.xlsx", &["PART", "QTY"], &[vec![CellValue::text("A1"), CellValue::Number(1.0)]]);

    let err = harness.session.import_stock(&path, None).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(!harness.session.has_table());
}

#[test]
fn test_import_headers_differing_only_in_case() {
    let mut harness = TestHarness::new();
    let path = harness.write_xlsx(
        "cased.xlsx",
        &["KOD", "Qty", "QTY", "row_id"],
        &[vec![CellValue::text("A1"), CellValue::Number(1.0), CellValue::Number(2.0), CellValue::text("x")]],
    );

    assert_eq!(harness.session.import_stock(&path, None).unwrap(), 1);
    let schema = harness.session.schema().unwrap();
    assert_eq!(schema.column_names(), vec!["KOD", "Qty", "QTY.1", "row_id.1"]);
    assert_eq!(harness.value_of("A1", "QTY.1"), Some(CellValue::Number(2.0)));
}

#[test]
fn test_operations_before_import_report_missing_table() {
    let mut harness = TestHarness::new();
    assert!(matches!(
        harness.session.add_row(&[("KOD", "A1")]),
        Err(AppError::Storage(PersistenceError::TableMissing))
    ));
}

// ============================================================================
// CELL EDITING
// ============================================================================

#[test]
fn test_edit_commit_persists() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("B2").unwrap();

    harness.session.begin_edit(row_id, "YER").unwrap();
    harness.session.edit_input("Shelf 9").unwrap();
    let edit = harness.session.commit_edit().unwrap().unwrap();

    assert_eq!(edit.previous, CellValue::text("R2"));
    assert_eq!(harness.session.editor().state(), &EditState::Viewing);

    harness.reopen();
    assert_eq!(harness.value_of("B2", "YER"), Some(CellValue::text("Shelf 9")));
}

#[test]
fn test_non_numeric_input_stays_editing() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("A1").unwrap();
    harness.session.begin_edit(row_id, "MİKTAR").unwrap();
    harness.session.edit_input("a lot").unwrap();

    let err = harness.session.commit_edit().unwrap_err();

    assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("MİKTAR")));
    assert!(harness.session.editor().is_editing());
    assert_eq!(harness.quantity_of("A1"), Some(5.0));

    harness.session.edit_input("7").unwrap();
    harness.session.commit_edit().unwrap();
    assert_eq!(harness.quantity_of("A1"), Some(7.0));
}

#[test]
fn test_unchanged_commit_writes_nothing() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("A1").unwrap();
    harness.session.begin_edit(row_id, "MİKTAR").unwrap();

    assert_eq!(harness.session.commit_edit().unwrap(), None);
    assert!(!harness.session.undo_state().can_undo);
}

#[test]
fn test_empty_input_clears_cell() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("C3").unwrap();
    harness.session.begin_edit(row_id, "MİKTAR").unwrap();
    harness.session.edit_input("").unwrap();
    harness.session.commit_edit().unwrap();

    assert_eq!(harness.value_of("C3", "MİKTAR"), Some(CellValue::Empty));
}

#[test]
fn test_second_cell_cancels_first_edit() {
    let mut harness = TestHarness::with_stock();
    let a1 = harness.row_id_of("A1").unwrap();
    let b2 = harness.row_id_of("B2").unwrap();

    harness.session.begin_edit(a1, "YER").unwrap();
    harness.session.edit_input("lost").unwrap();
    harness.session.begin_edit(b2, "YER").unwrap();

    assert_eq!(harness.session.editor().active().map(|e| e.row_id), Some(b2));
    assert_eq!(harness.value_of("A1", "YER"), Some(CellValue::text("R1")));
}

#[test]
fn test_cancel_edit_has_no_side_effect() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("A1").unwrap();
    harness.session.begin_edit(row_id, "PAKET").unwrap();
    harness.session.edit_input("1206").unwrap();

    let cancelled = harness.session.cancel_edit().unwrap();

    assert_eq!(cancelled.buffer, "1206");
    assert_eq!(harness.value_of("A1", "PAKET"), Some(CellValue::text("0805")));
    assert!(!harness.session.undo_state().can_undo);
}

#[test]
fn test_begin_edit_unknown_targets() {
    let mut harness = TestHarness::with_stock();
    assert!(matches!(harness.session.begin_edit(1, "COLOR"), Err(AppError::Validation(_))));
    assert!(matches!(
        harness.session.begin_edit(99, "KOD"),
        Err(AppError::Storage(PersistenceError::RowNotFound(99)))
    ));
}

// ============================================================================
// ADD / DELETE
// ============================================================================

#[test]
fn test_add_row_validates_every_field() {
    let mut harness = TestHarness::with_stock();

    assert!(matches!(
        harness.session.add_row(&[("KOD", "D4"), ("MİKTAR", "1.5")]),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        harness.session.add_row(&[("PAKET", "0402")]),
        Err(AppError::Validation(_))
    ));
    assert_eq!(harness.row_count(), 3);

    harness
        .session
        .add_row(&[("KOD", "D4"), ("PAKET", "0402"), ("MİKTAR", "12")])
        .unwrap();
    assert_eq!(harness.quantity_of("D4"), Some(12.0));
    assert_eq!(harness.value_of("D4", "YER"), Some(CellValue::Empty));
}

#[test]
fn test_delete_row_cancels_its_edit() {
    let mut harness = TestHarness::with_stock();
    let row_id = harness.row_id_of("A1").unwrap();
    harness.session.begin_edit(row_id, "YER").unwrap();

    let previous = harness.session.delete_row(row_id).unwrap();

    assert_eq!(previous.get("KOD"), Some(&CellValue::text("A1")));
    assert!(!harness.session.editor().is_editing());
    assert_eq!(harness.row_count(), 2);
}

// ============================================================================
// VIEW AND EXPORT
// ============================================================================

#[test]
fn test_search_sort_and_row_count() {
    let mut harness = TestHarness::with_stock();

    harness.session.set_search("r2");
    assert_eq!(harness.session.row_count().unwrap(), 1);

    harness.session.reset_view();
    harness.session.toggle_sort("MİKTAR").unwrap();
    harness.session.toggle_sort("MİKTAR").unwrap();
    let codes: Vec<String> = harness
        .session
        .visible_rows()
        .unwrap()
        .iter()
        .map(|row| row.record.get("KOD").unwrap().display_value())
        .collect();
    assert_eq!(codes, vec!["B2", "A1", "C3"]);

    assert!(matches!(harness.session.toggle_sort("COLOR"), Err(AppError::Validation(_))));
}

#[test]
fn test_export_round_trip() {
    let mut harness = TestHarness::with_stock();
    harness.session.add_row(&[("KOD", "D4")]).unwrap();
    let path = harness.dir.path().join("export.xlsx");

    let written = harness.session.export_xlsx(&path).unwrap();
    let sheet = load_xlsx(&path, None).unwrap();

    assert_eq!(written, 4);
    assert_eq!(sheet.headers, STOCK_HEADERS.to_vec());
    assert_eq!(sheet.rows.len(), 4);
    assert_eq!(sheet.rows[0].get("KOD"), Some(&CellValue::text("A1")));
    assert_eq!(sheet.rows[3].get("MİKTAR"), Some(&CellValue::Empty));
}
