//! FILENAME: app/src/api_types.rs
// PURPOSE: Result types returned by session operations to a front end.

use engine::{ComparisonResult, RowId};
use serde::Serialize;

/// Result of an undo operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResult {
    /// Description of what was undone
    pub description: String,
    /// Rows whose contents were restored, removed or re-inserted
    pub affected_rows: Vec<RowId>,
}

/// Current undo state for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoState {
    pub can_undo: bool,
    pub undo_description: Option<String>,
}

/// A staged upload compared against the current table.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadComparison {
    pub result: ComparisonResult,
    /// Upload rows whose quantity cell was blank or not a number.
    pub skipped_quantities: Vec<usize>,
}

/// What an applied upload changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySummary {
    pub updated: usize,
    pub inserted: usize,
    /// Raw values left without a code; they need an alias.
    pub unmatched: Vec<String>,
    pub skipped_quantities: Vec<usize>,
    /// Codes whose stored quantity was not a number and was left as stored.
    pub kept_quantities: Vec<String>,
}
