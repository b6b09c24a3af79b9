//! FILENAME: core/engine/src/comparison.rs
//! PURPOSE: Partitions a normalized upload into updates, inserts and
//! unmatched rows.
//! CONTEXT: Pure with respect to storage. The result describes the writes
//! an apply would perform; the session commits them in one transaction or
//! not at all.
//!
//! Accumulation policy:
//! - upload rows sharing a code are grouped first, in order of first appearance;
//! - quantity fields are summed within the group and then added to the stored quantity;
//! - other fields overwrite, later upload rows winning; blank uploaded cells never erase;
//! - a stored quantity that is neither blank nor a number is kept as stored and reported.

use crate::normalizer::{NormalizedRow, Resolution, UploadSettings};
use crate::record::{RowId, StockRecord};
use crate::table::{RowWrite, StockTable};
use crate::value::CellValue;
use std::collections::HashMap;

/// Stored versus requested quantity for a matched row.
#[derive(Debug, Clone, PartialEq)]
pub struct StockCheck {
    pub column: String,
    pub stored: f64,
    pub requested: f64,
    /// `requested` when stock covers it, otherwise the (negative) shortfall.
    pub in_stock: f64,
}

impl StockCheck {
    fn new(column: &str, stored: f64, requested: f64) -> Self {
        let in_stock = if requested > stored { stored - requested } else { requested };
        Self {
            column: column.to_string(),
            stored,
            requested,
            in_stock,
        }
    }
}

/// An existing record that the upload updates.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRow {
    pub row_id: RowId,
    pub code: String,
    /// Upload rows folded into this update, with how each was resolved.
    pub sources: Vec<(usize, Resolution)>,
    pub previous: StockRecord,
    pub updated: StockRecord,
    pub stock_check: Option<StockCheck>,
    pub location: Option<CellValue>,
    /// Quantity columns left as stored because the stored value is not a number.
    pub kept_quantities: Vec<String>,
}

impl MatchedRow {
    pub fn via_alias(&self) -> bool {
        self.sources.iter().any(|(_, via)| *via == Resolution::Alias)
    }

    pub fn is_change(&self) -> bool {
        self.previous != self.updated
    }
}

/// A resolved code that has no record yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRow {
    pub code: String,
    pub sources: Vec<usize>,
    pub record: StockRecord,
}

/// An upload row whose value resolved to no code; it needs an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRow {
    pub source_index: usize,
    pub raw_value: String,
    pub record: StockRecord,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonResult {
    pub matched: Vec<MatchedRow>,
    pub inserts: Vec<NewRow>,
    pub unmatched: Vec<UnmatchedRow>,
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.inserts.is_empty() && self.unmatched.is_empty()
    }

    /// Distinct raw values that still need an alias, in upload order.
    pub fn unmatched_values(&self) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for row in &self.unmatched {
            if !row.raw_value.is_empty() && !values.contains(&row.raw_value) {
                values.push(row.raw_value.clone());
            }
        }
        values
    }

    /// Codes whose stored quantity could not be summed.
    pub fn kept_quantity_codes(&self) -> Vec<String> {
        self.matched
            .iter()
            .filter(|m| !m.kept_quantities.is_empty())
            .map(|m| m.code.clone())
            .collect()
    }

    /// The writes applying this result would perform. Matched rows that
    /// end up identical to the stored record are left out.
    pub fn writes(&self) -> Vec<RowWrite> {
        let updates = self
            .matched
            .iter()
            .filter(|m| m.is_change())
            .map(|m| RowWrite::Update {
                row_id: m.row_id,
                record: m.updated.clone(),
            });
        let inserts = self.inserts.iter().map(|n| RowWrite::Insert {
            record: n.record.clone(),
        });
        updates.chain(inserts).collect()
    }
}

/// Uploaded values for one code, accumulated across upload rows.
struct CodeGroup {
    code: String,
    sources: Vec<(usize, Resolution)>,
    /// Non-quantity fields keyed by table column.
    fields: StockRecord,
    /// Summed quantities keyed by table column.
    quantities: Vec<(String, f64)>,
}

impl CodeGroup {
    fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            sources: Vec::new(),
            fields: StockRecord::new(),
            quantities: Vec::new(),
        }
    }

    fn add_quantity(&mut self, column: &str, amount: f64) {
        match self.quantities.iter_mut().find(|(c, _)| c == column) {
            Some((_, total)) => *total += amount,
            None => self.quantities.push((column.to_string(), amount)),
        }
    }

    fn absorb(&mut self, row: &NormalizedRow, via: Resolution, settings: &UploadSettings, table: &StockTable) {
        self.sources.push((row.source_index, via));
        let schema = table.schema();

        for (upload_column, value) in row.record.iter() {
            let target = settings.target_column(upload_column);
            if target == schema.code_column() {
                continue;
            }
            let Some(def) = schema.column(target) else {
                continue;
            };
            if settings.is_quantity_column(upload_column) {
                if let Some(amount) = value.as_number() {
                    self.add_quantity(target, amount);
                }
            } else if !value.is_empty() {
                self.fields.set(target, def.column_type.coerce(value));
            }
        }
    }
}

/// Compares normalized upload rows against the current table.
pub fn compare(rows: &[NormalizedRow], table: &StockTable, settings: &UploadSettings) -> ComparisonResult {
    let mut result = ComparisonResult::default();
    let mut groups: Vec<CodeGroup> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(resolved) = &row.resolved else {
            result.unmatched.push(UnmatchedRow {
                source_index: row.source_index,
                raw_value: row.raw_value.clone(),
                record: row.record.clone(),
            });
            continue;
        };
        let idx = *group_of.entry(resolved.code.clone()).or_insert_with(|| {
            groups.push(CodeGroup::new(&resolved.code));
            groups.len() - 1
        });
        groups[idx].absorb(row, resolved.via, settings, table);
    }

    let index = table.code_index();
    let schema = table.schema();

    for group in groups {
        match index.get(&group.code) {
            Some(existing) => {
                let previous = existing.record.clone();
                let mut updated = previous.clone();
                for (column, value) in group.fields.iter() {
                    updated.set(column, value.clone());
                }

                let mut stock_check = None;
                let mut kept_quantities = Vec::new();
                for (column, amount) in &group.quantities {
                    let stored = match previous.get(column) {
                        None | Some(CellValue::Empty) => 0.0,
                        Some(value) => match value.as_number() {
                            Some(stored) => stored,
                            None => {
                                kept_quantities.push(column.clone());
                                continue;
                            }
                        },
                    };
                    if stock_check.is_none() {
                        stock_check = Some(StockCheck::new(column, stored, *amount));
                    }
                    updated.set(column.clone(), CellValue::Number(stored + amount));
                }

                let location = settings
                    .location_column
                    .as_deref()
                    .and_then(|column| previous.get(column))
                    .cloned();

                result.matched.push(MatchedRow {
                    row_id: existing.row_id,
                    code: group.code,
                    sources: group.sources,
                    previous,
                    updated,
                    stock_check,
                    location,
                    kept_quantities,
                });
            }
            None => {
                let mut record = StockRecord::new().project(&schema.column_names());
                record.set(schema.code_column(), CellValue::Text(group.code.clone()));
                for (column, value) in group.fields.iter() {
                    record.set(column, value.clone());
                }
                for (column, amount) in &group.quantities {
                    record.set(column.clone(), CellValue::Number(*amount));
                }

                result.inserts.push(NewRow {
                    code: group.code,
                    sources: group.sources.into_iter().map(|(idx, _)| idx).collect(),
                    record,
                });
            }
        }
    }

    result
}
