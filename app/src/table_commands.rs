//! FILENAME: app/src/table_commands.rs
// PURPOSE: In-place cell editing, row addition and deletion, export.

use crate::error::AppError;
use crate::logging::{log_debug, log_info};
use crate::session::Session;
use engine::{
    ActiveEdit, CellEdit, CellValue, CommitOutcome, EngineError, RowChange, RowId, StockRecord,
    UndoAction,
};
use persistence::{save_xlsx, PersistenceError, SheetData};
use std::path::Path;

impl Session {
    /// Opens a cell for editing. An edit already open elsewhere is cancelled.
    pub fn begin_edit(&mut self, row_id: RowId, column: &str) -> Result<(), AppError> {
        let table = self.table()?;
        if !table.schema().has_column(column) {
            return Err(EngineError::UnknownColumn(column.to_string()).into());
        }
        let current = table
            .row(row_id)
            .ok_or(PersistenceError::RowNotFound(row_id))?
            .record
            .get(column)
            .cloned()
            .unwrap_or_default();

        if let Some(cancelled) = self.editor.begin(row_id, column, current) {
            log_debug!(
                "EDIT",
                "Cancelled edit of row {} column {}",
                cancelled.row_id,
                cancelled.column
            );
        }
        Ok(())
    }

    pub fn edit_input(&mut self, text: &str) -> Result<(), AppError> {
        self.editor.input(text)?;
        Ok(())
    }

    /// Validates and writes the open edit. Returns None when the value did
    /// not change. On a validation or storage error the cell stays open.
    pub fn commit_edit(&mut self) -> Result<Option<CellEdit>, AppError> {
        let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
        let schema = table.schema();

        let pending = match self.editor.commit(schema)? {
            CommitOutcome::Unchanged => {
                log_debug!("EDIT", "Commit without change");
                return Ok(None);
            }
            CommitOutcome::Pending(edit) => edit,
        };

        let previous = match self
            .db
            .update_cell(schema, pending.row_id, &pending.column, &pending.value)
        {
            Ok(previous) => previous,
            Err(e) => {
                self.editor.abort_commit();
                return Err(e.into());
            }
        };

        let edit = self.editor.finish_commit()?;
        log_info!(
            "EDIT",
            "Row {} {}: '{}' -> '{}'",
            edit.row_id,
            edit.column,
            edit.previous.display_value(),
            edit.value.display_value()
        );
        self.record_undo(UndoAction::single(
            format!("Edit {}", edit.column),
            RowChange::Updated {
                row_id: edit.row_id,
                previous,
            },
        ));
        self.reload_table()?;
        Ok(Some(edit))
    }

    pub fn cancel_edit(&mut self) -> Option<ActiveEdit> {
        self.editor.cancel()
    }

    /// Validates every field and inserts a new row. Columns not given are
    /// left empty; the code column must be filled.
    pub fn add_row<K: AsRef<str>, V: AsRef<str>>(&mut self, fields: &[(K, V)]) -> Result<RowId, AppError> {
        let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
        let schema = table.schema();

        let mut record: StockRecord = schema
            .columns()
            .iter()
            .map(|def| (def.name.clone(), CellValue::Empty))
            .collect();
        for (column, input) in fields {
            let value = schema.validate_input(column.as_ref(), input.as_ref())?;
            record.set(column.as_ref(), value);
        }
        if schema.code_of(&record).is_none() {
            return Err(EngineError::EmptyField(schema.code_column().to_string()).into());
        }

        let row_id = self.db.insert_row(schema, &record)?;
        log_info!(
            "EDIT",
            "Added row {} ({})",
            row_id,
            schema.code_of(&record).unwrap_or_default()
        );
        self.record_undo(UndoAction::single("Add row", RowChange::Inserted { row_id }));
        self.reload_table()?;
        Ok(row_id)
    }

    /// Deletes a row, returning what it held.
    pub fn delete_row(&mut self, row_id: RowId) -> Result<StockRecord, AppError> {
        let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
        if self.editor.active().map(|edit| edit.row_id) == Some(row_id) {
            self.editor.cancel();
        }

        let previous = self.db.delete_row(table.schema(), row_id)?;
        log_info!("EDIT", "Deleted row {}", row_id);
        self.record_undo(UndoAction::single(
            "Delete row",
            RowChange::Deleted {
                row_id,
                previous: previous.clone(),
            },
        ));
        self.reload_table()?;
        Ok(previous)
    }

    /// Writes the whole table to an XLSX file. Returns the row count.
    pub fn export_xlsx(&self, path: &Path) -> Result<usize, AppError> {
        let sheet = SheetData::from_table(self.table()?);
        save_xlsx(&sheet, path)?;
        log_info!("EXPORT", "Exported {} rows to {}", sheet.rows.len(), path.display());
        Ok(sheet.rows.len())
    }
}
