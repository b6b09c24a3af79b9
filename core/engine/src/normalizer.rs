//! FILENAME: core/engine/src/normalizer.rs
//! PURPOSE: Resolves uploaded rows to canonical codes.
//! CONTEXT: First step of the upload flow. Quantity fields are scaled by
//! the upload multiplier here and nowhere else. The raw `Upload` is never
//! modified, so changing the multiplier and normalizing again starts from
//! the original quantities instead of compounding.

use crate::alias::AliasResolver;
use crate::error::EngineError;
use crate::record::StockRecord;
use crate::table::CodeIndex;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Per-upload scalar applied to quantity fields. Finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multiplier(f64);

impl Multiplier {
    pub fn new(value: f64) -> Result<Self, EngineError> {
        if value.is_finite() && value > 0.0 {
            Ok(Multiplier(value))
        } else {
            Err(EngineError::InvalidMultiplier(value.to_string()))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_identity(&self) -> bool {
        self.0 == 1.0
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier(1.0)
    }
}

impl FromStr for Multiplier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Multiplier::default());
        }
        trimmed
            .parse::<f64>()
            .map_err(|_| EngineError::InvalidMultiplier(s.to_string()))
            .and_then(Multiplier::new)
    }
}

/// How an upload is read against the stock table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Upload column holding the value matched against KODs.
    pub match_column: String,
    /// Upload columns that hold quantities.
    pub quantity_columns: Vec<String>,
    pub multiplier: Multiplier,
    /// Upload column name -> table column name, for columns whose names differ.
    pub column_map: BTreeMap<String, String>,
    /// Table column shown next to matched rows (the storage location).
    pub location_column: Option<String>,
}

impl UploadSettings {
    pub fn new(match_column: impl Into<String>) -> Self {
        Self {
            match_column: match_column.into(),
            quantity_columns: Vec::new(),
            multiplier: Multiplier::default(),
            column_map: BTreeMap::new(),
            location_column: None,
        }
    }

    pub fn with_quantity_column(mut self, column: impl Into<String>) -> Self {
        self.quantity_columns.push(column.into());
        self
    }

    pub fn with_multiplier(mut self, multiplier: Multiplier) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_column_mapping(mut self, upload: impl Into<String>, table: impl Into<String>) -> Self {
        self.column_map.insert(upload.into(), table.into());
        self
    }

    pub fn with_location_column(mut self, column: impl Into<String>) -> Self {
        self.location_column = Some(column.into());
        self
    }

    /// Table column an upload column writes to.
    pub fn target_column<'a>(&'a self, upload_column: &'a str) -> &'a str {
        self.column_map
            .get(upload_column)
            .map(String::as_str)
            .unwrap_or(upload_column)
    }

    pub fn is_quantity_column(&self, upload_column: &str) -> bool {
        self.quantity_columns.iter().any(|c| c == upload_column)
    }
}

/// Raw rows of an uploaded file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Upload {
    pub headers: Vec<String>,
    pub rows: Vec<StockRecord>,
}

impl Upload {
    pub fn new(headers: Vec<String>, rows: Vec<StockRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The raw value is itself a KOD in the table.
    Direct,
    /// The raw value was found in the alias table.
    Alias,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCode {
    pub code: String,
    pub via: Resolution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Position of the row in the upload.
    pub source_index: usize,
    /// Trimmed text of the match column.
    pub raw_value: String,
    pub resolved: Option<ResolvedCode>,
    /// The uploaded row with quantities already multiplied.
    pub record: StockRecord,
}

impl NormalizedRow {
    pub fn code(&self) -> Option<&str> {
        self.resolved.as_ref().map(|r| r.code.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    /// Upload rows whose quantity cell was blank or not a number.
    pub skipped_quantities: Vec<usize>,
}

/// Resolves every upload row and applies the multiplier.
pub fn normalize(
    upload: &Upload,
    settings: &UploadSettings,
    table: &CodeIndex<'_>,
    aliases: &impl AliasResolver,
) -> Normalized {
    let mut normalized = Normalized::default();

    for (source_index, raw) in upload.rows.iter().enumerate() {
        let (record, skipped) = scale_quantities(raw, settings);
        if skipped {
            normalized.skipped_quantities.push(source_index);
        }

        let raw_value = raw.text_of(&settings.match_column).unwrap_or_default();
        let resolved = resolve_code(&raw_value, table, aliases);

        normalized.rows.push(NormalizedRow {
            source_index,
            raw_value,
            resolved,
            record,
        });
    }

    normalized
}

fn resolve_code(raw_value: &str, table: &CodeIndex<'_>, aliases: &impl AliasResolver) -> Option<ResolvedCode> {
    if raw_value.is_empty() {
        return None;
    }
    if table.contains(raw_value) {
        return Some(ResolvedCode {
            code: raw_value.to_string(),
            via: Resolution::Direct,
        });
    }
    aliases
        .resolve(raw_value)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .map(|code| ResolvedCode {
            code,
            via: Resolution::Alias,
        })
}

/// Multiplies every quantity field. Returns the scaled copy and whether
/// any quantity cell had to be left as it was.
fn scale_quantities(raw: &StockRecord, settings: &UploadSettings) -> (StockRecord, bool) {
    let mut record = raw.clone();
    let mut skipped = false;

    for column in &settings.quantity_columns {
        let Some(value) = raw.get(column) else {
            continue;
        };
        match value.as_number() {
            Some(quantity) => {
                record.set(column.clone(), CellValue::Number(quantity * settings.multiplier.value()));
            }
            None => skipped = true,
        }
    }

    (record, skipped)
}
