//! FILENAME: app/src/undo_commands.rs
// PURPOSE: Single-step undo of the last table mutation.

use crate::api_types::{UndoResult, UndoState};
use crate::error::AppError;
use crate::logging::{log_error, log_info};
use crate::session::Session;
use engine::{EngineError, RowChange};
use persistence::PersistenceError;

impl Session {
    /// Get current undo state for UI.
    pub fn undo_state(&self) -> UndoState {
        UndoState {
            can_undo: self.undo_slot.can_undo(),
            undo_description: self.undo_slot.undo_description().map(String::from),
        }
    }

    /// Reverts the last mutation. The action is taken from the slot only
    /// once the revert has been committed; a failed revert leaves both the
    /// slot and the table as they were.
    pub fn undo(&mut self) -> Result<UndoResult, AppError> {
        let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
        let pending = match self.undo_slot.peek() {
            Ok(action) => action,
            Err(EngineError::NoPendingAction) => {
                log_info!("UNDO", "Nothing to undo");
                return Err(AppError::NoPendingAction);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.db.revert(table.schema(), pending) {
            log_error!("UNDO", "Failed to undo '{}': {}", pending.description, e);
            return Err(e.into());
        }
        let action = self.undo_slot.take()?;
        self.editor.cancel();

        log_info!(
            "UNDO",
            "Undid '{}' ({} changes)",
            action.description,
            action.changes.len()
        );
        self.reload_table()?;

        Ok(UndoResult {
            description: action.description,
            affected_rows: action.changes.iter().map(RowChange::row_id).collect(),
        })
    }
}
