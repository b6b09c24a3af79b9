//! FILENAME: core/engine/src/view.rs
//! PURPOSE: Search and sort over the stock table, and the code catalog
//! shown when picking a KOD for an alias.

use crate::record::StockRecord;
use crate::schema::Schema;
use crate::table::{StockRow, StockTable};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

/// Current search text and sort order of the table view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    query: String,
    sort: Option<SortKey>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn sort_by(&mut self, column: impl Into<String>, descending: bool) {
        self.sort = Some(SortKey {
            column: column.into(),
            descending,
        });
    }

    /// Sorts ascending by a column, or flips the direction when the view is
    /// already sorted by it.
    pub fn toggle_sort(&mut self, column: &str) {
        let descending = match &self.sort {
            Some(key) if key.column == column => !key.descending,
            _ => false,
        };
        self.sort_by(column, descending);
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.sort = None;
    }

    /// Rows matching the query, in display order.
    pub fn visible_rows<'a>(&self, table: &'a StockTable) -> Vec<&'a StockRow> {
        let needle = self.query.trim().to_lowercase();
        let mut rows: Vec<&StockRow> = table
            .rows()
            .iter()
            .filter(|row| needle.is_empty() || matches_query(&row.record, &needle))
            .collect();

        if let Some(key) = &self.sort {
            sort_rows(&mut rows, table.schema(), key);
        }
        rows
    }

    pub fn row_count(&self, table: &StockTable) -> usize {
        self.visible_rows(table).len()
    }
}

fn matches_query(record: &StockRecord, needle: &str) -> bool {
    record
        .values()
        .any(|value| value.display_value().to_lowercase().contains(needle))
}

fn sort_rows(rows: &mut [&StockRow], schema: &Schema, key: &SortKey) {
    let numeric = schema
        .column(&key.column)
        .map(|def| def.column_type.is_numeric())
        .unwrap_or(false);

    // Stable sort: ties keep row id order.
    rows.sort_by(|a, b| {
        let a = a.record.get(&key.column);
        let b = b.record.get(&key.column);
        let ordering = if numeric {
            // Blank and non-numeric cells sort first.
            let a = a.and_then(|v| v.as_number()).unwrap_or(f64::NEG_INFINITY);
            let b = b.and_then(|v| v.as_number()).unwrap_or(f64::NEG_INFINITY);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        } else {
            let a = a.map(|v| v.display_value().to_lowercase()).unwrap_or_default();
            let b = b.map(|v| v.display_value().to_lowercase()).unwrap_or_default();
            a.cmp(&b)
        };
        if key.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// A KOD with the descriptive column shown beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLabel {
    pub code: String,
    pub label: String,
}

/// Distinct (code, label) pairs, sorted by code. Rows without a code are skipped.
pub fn code_catalog(table: &StockTable, label_column: Option<&str>) -> Vec<CodeLabel> {
    let schema = table.schema();
    let mut catalog: Vec<CodeLabel> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let code = schema.code_of(&row.record)?;
            let label = label_column
                .and_then(|column| row.record.get(column))
                .map(|value| value.display_value())
                .unwrap_or_default();
            Some(CodeLabel { code, label })
        })
        .collect();
    catalog.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.label.cmp(&b.label)));
    catalog.dedup();
    catalog
}

/// Case-insensitive substring filter on code or label.
pub fn filter_catalog<'a>(catalog: &'a [CodeLabel], query: &str) -> Vec<&'a CodeLabel> {
    let needle = query.trim().to_lowercase();
    catalog
        .iter()
        .filter(|entry| {
            needle.is_empty()
                || entry.code.to_lowercase().contains(&needle)
                || entry.label.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ColumnType};
    use crate::value::CellValue;

    fn table() -> StockTable {
        let schema = Schema::new(
            vec![
                ColumnDef::new("KOD", ColumnType::Text),
                ColumnDef::new("PAKET", ColumnType::Text),
                ColumnDef::new("MİKTAR", ColumnType::Integer),
            ],
            "KOD",
        )
        .unwrap();
        let rows = [
            (1, "b-200", "SOT23", CellValue::Number(20.0)),
            (2, "A-100", "0805", CellValue::Empty),
            (3, "c-300", "0805", CellValue::Number(3.0)),
            (4, "A-100", "0805", CellValue::Number(1.0)),
        ]
        .into_iter()
        .map(|(row_id, code, paket, qty)| {
            let mut record = StockRecord::new();
            record.set("KOD", CellValue::text(code));
            record.set("PAKET", CellValue::text(paket));
            record.set("MİKTAR", qty);
            StockRow { row_id, record }
        })
        .collect();
        StockTable::new(schema, rows)
    }

    fn ids(rows: &[&StockRow]) -> Vec<i64> {
        rows.iter().map(|r| r.row_id).collect()
    }

    #[test]
    fn test_query_matches_any_column_case_insensitive() {
        let table = table();
        let mut view = TableView::new();
        view.set_query("sot");

        assert_eq!(ids(&view.visible_rows(&table)), vec![1]);
        view.set_query("0805");
        assert_eq!(view.row_count(&table), 3);
    }

    #[test]
    fn test_numeric_sort_puts_blanks_first() {
        let table = table();
        let mut view = TableView::new();
        view.toggle_sort("MİKTAR");
        assert_eq!(ids(&view.visible_rows(&table)), vec![2, 4, 3, 1]);

        view.toggle_sort("MİKTAR");
        assert_eq!(ids(&view.visible_rows(&table)), vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_text_sort_ignores_case() {
        let table = table();
        let mut view = TableView::new();
        view.sort_by("KOD", false);
        assert_eq!(ids(&view.visible_rows(&table)), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_code_catalog_dedups_and_filters() {
        let table = table();
        let catalog = code_catalog(&table, Some("PAKET"));

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0], CodeLabel { code: "A-100".into(), label: "0805".into() });

        let hits = filter_catalog(&catalog, "sot");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "b-200");
        assert_eq!(filter_catalog(&catalog, "").len(), 3);
    }
}
