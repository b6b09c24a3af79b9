//! FILENAME: core/engine/src/undo.rs
//! PURPOSE: Single-step undo for table mutations.
//! CONTEXT: Stores the inverse of the most recent mutation only. Each new
//! mutation overwrites the slot, and an undo consumes it, so a second
//! consecutive undo has nothing to do. An applied upload is recorded as one
//! action holding all of its row changes.

use crate::error::EngineError;
use crate::record::{RowId, StockRecord};

/// Represents a single row mutation that can be reverted.
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    /// A row was added. Reverting deletes it.
    Inserted { row_id: RowId },
    /// A row was modified. Reverting restores `previous`.
    Updated { row_id: RowId, previous: StockRecord },
    /// A row was removed. Reverting re-inserts `previous` under the same id.
    Deleted { row_id: RowId, previous: StockRecord },
}

impl RowChange {
    pub fn row_id(&self) -> RowId {
        match self {
            RowChange::Inserted { row_id }
            | RowChange::Updated { row_id, .. }
            | RowChange::Deleted { row_id, .. } => *row_id,
        }
    }
}

/// The changes made by one user action.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    /// Human-readable description (e.g., "Edit MİKTAR", "Apply upload")
    pub description: String,
    /// The individual changes in this action (in order applied)
    pub changes: Vec<RowChange>,
}

impl UndoAction {
    pub fn new(description: impl Into<String>) -> Self {
        UndoAction {
            description: description.into(),
            changes: Vec::new(),
        }
    }

    pub fn single(description: impl Into<String>, change: RowChange) -> Self {
        let mut action = Self::new(description);
        action.add_change(change);
        action
    }

    pub fn add_change(&mut self, change: RowChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Holds at most one pending undo action.
#[derive(Debug, Default)]
pub struct UndoSlot {
    pending: Option<UndoAction>,
}

impl UndoSlot {
    pub fn new() -> Self {
        UndoSlot { pending: None }
    }

    /// Record an action, replacing whatever was pending.
    /// Empty actions are ignored and leave the slot as it was.
    pub fn record(&mut self, action: UndoAction) {
        if !action.is_empty() {
            self.pending = Some(action);
        }
    }

    pub fn pending(&self) -> Option<&UndoAction> {
        self.pending.as_ref()
    }

    /// The pending action, or `NoPendingAction` when the slot is empty.
    /// The slot is left filled; call `take` once the inverse is applied.
    pub fn peek(&self) -> Result<&UndoAction, EngineError> {
        self.pending.as_ref().ok_or(EngineError::NoPendingAction)
    }

    /// Remove and return the pending action.
    pub fn take(&mut self) -> Result<UndoAction, EngineError> {
        self.pending.take().ok_or(EngineError::NoPendingAction)
    }

    pub fn can_undo(&self) -> bool {
        self.pending.is_some()
    }

    /// Get description of the pending action (for UI).
    pub fn undo_description(&self) -> Option<&str> {
        self.pending.as_ref().map(|a| a.description.as_str())
    }
}
