//! FILENAME: core/engine/src/editor.rs
//! PURPOSE: State machine for in-place cell editing.
//! CONTEXT: Viewing -> Editing -> Committing -> Viewing, or
//! Editing -> Viewing on cancel. Only one cell is edited at a time. The
//! editor validates input but does not persist anything: the session
//! writes the committed value and then calls `finish_commit`, or
//! `abort_commit` when the write failed.

use crate::error::EngineError;
use crate::record::RowId;
use crate::schema::Schema;
use crate::value::CellValue;

/// A cell currently open for editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEdit {
    pub row_id: RowId,
    pub column: String,
    pub original: CellValue,
    /// Text the user has typed so far.
    pub buffer: String,
}

/// A validated edit waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row_id: RowId,
    pub column: String,
    pub previous: CellValue,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Viewing,
    Editing(ActiveEdit),
    Committing { edit: ActiveEdit, pending: CellEdit },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The value equals the stored one; nothing to write.
    Unchanged,
    /// The value must be written, then `finish_commit` called.
    Pending(CellEdit),
}

#[derive(Debug)]
pub struct CellEditor {
    state: EditState,
}

impl CellEditor {
    pub fn new() -> Self {
        Self {
            state: EditState::Viewing,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        !matches!(self.state, EditState::Viewing)
    }

    pub fn active(&self) -> Option<&ActiveEdit> {
        match &self.state {
            EditState::Viewing => None,
            EditState::Editing(edit) | EditState::Committing { edit, .. } => Some(edit),
        }
    }

    /// Opens a cell for editing with its current text in the buffer.
    /// An edit already open on another cell is cancelled and returned.
    pub fn begin(&mut self, row_id: RowId, column: impl Into<String>, current: CellValue) -> Option<ActiveEdit> {
        let cancelled = self.cancel();
        let buffer = current.display_value();
        self.state = EditState::Editing(ActiveEdit {
            row_id,
            column: column.into(),
            original: current,
            buffer,
        });
        cancelled
    }

    /// Replaces the edit buffer.
    pub fn input(&mut self, text: impl Into<String>) -> Result<(), EngineError> {
        match &mut self.state {
            EditState::Editing(edit) => {
                edit.buffer = text.into();
                Ok(())
            }
            _ => Err(EngineError::NoActiveEdit),
        }
    }

    /// Validates the buffer against the column type.
    /// On a validation error the cell stays in Editing.
    pub fn commit(&mut self, schema: &Schema) -> Result<CommitOutcome, EngineError> {
        let edit = match &self.state {
            EditState::Editing(edit) => edit.clone(),
            _ => return Err(EngineError::NoActiveEdit),
        };

        let value = schema.validate_input(&edit.column, &edit.buffer)?;
        if same_value(&value, &edit.original) {
            self.state = EditState::Viewing;
            return Ok(CommitOutcome::Unchanged);
        }

        let pending = CellEdit {
            row_id: edit.row_id,
            column: edit.column.clone(),
            previous: edit.original.clone(),
            value,
        };
        self.state = EditState::Committing {
            edit,
            pending: pending.clone(),
        };
        Ok(CommitOutcome::Pending(pending))
    }

    /// The pending write succeeded.
    pub fn finish_commit(&mut self) -> Result<CellEdit, EngineError> {
        match std::mem::replace(&mut self.state, EditState::Viewing) {
            EditState::Committing { pending, .. } => Ok(pending),
            other => {
                self.state = other;
                Err(EngineError::NoActiveEdit)
            }
        }
    }

    /// The pending write failed; the cell goes back to Editing.
    pub fn abort_commit(&mut self) {
        if let EditState::Committing { edit, .. } = std::mem::replace(&mut self.state, EditState::Viewing) {
            self.state = EditState::Editing(edit);
        }
    }

    /// Discards the open edit, if any.
    pub fn cancel(&mut self) -> Option<ActiveEdit> {
        match std::mem::replace(&mut self.state, EditState::Viewing) {
            EditState::Viewing => None,
            EditState::Editing(edit) | EditState::Committing { edit, .. } => Some(edit),
        }
    }
}

impl Default for CellEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn same_value(a: &CellValue, b: &CellValue) -> bool {
    match (a, b) {
        (CellValue::Empty, other) | (other, CellValue::Empty) => other.is_empty(),
        (CellValue::Number(x), other) | (other, CellValue::Number(x)) => other.as_number() == Some(*x),
        _ => a == b,
    }
}
