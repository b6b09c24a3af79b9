//! FILENAME: app/src/session.rs
//! PURPOSE: The session context for one open stock database.
//! CONTEXT: Owns the database connection together with everything derived
//! from it: the in-memory stock table, the alias cache, the undo slot, the
//! cell editor and the table view. Every write goes through `&mut self`, and
//! the in-memory table is reloaded from the database after each one, so the
//! view never shows a state the database does not hold.
//!
//! Operations are split by concern across the `*_commands` modules, each
//! adding an `impl Session` block.

use crate::api_types::UploadComparison;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::logging::{log_debug, log_enter, log_exit, log_info};
use engine::{
    AliasTable, CellEditor, Schema, StockRow, StockTable, TableView, UndoAction, UndoSlot, Upload,
    UploadSettings,
};
use persistence::{load_xlsx, Database, PersistenceError};
use std::path::Path;

/// An uploaded file waiting to be compared and applied.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Rows exactly as read from the file; never scaled in place.
    pub upload: Upload,
    pub settings: UploadSettings,
    /// Latest comparison shown to the user, cleared whenever the table or
    /// the aliases change.
    pub(crate) comparison: Option<UploadComparison>,
}

pub struct Session {
    pub(crate) config: AppConfig,
    pub(crate) db: Database,
    /// None until the first stock sheet is imported.
    pub(crate) table: Option<StockTable>,
    pub(crate) aliases: AliasTable,
    pub(crate) undo_slot: UndoSlot,
    pub(crate) editor: CellEditor,
    pub(crate) view: TableView,
    pub(crate) upload: Option<PendingUpload>,
}

impl Session {
    /// Opens the database named in the configuration.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        log_info!("SESSION", "Opening database {}", config.database.path.display());
        let db = Database::open(&config.database.path)?;
        Self::with_database(config, db)
    }

    pub fn open_in_memory(config: AppConfig) -> Result<Self, AppError> {
        log_info!("SESSION", "Opening in-memory database");
        Self::with_database(config, Database::open_in_memory()?)
    }

    fn with_database(config: AppConfig, db: Database) -> Result<Self, AppError> {
        let table = if db.has_record_table()? {
            Some(db.load_table()?)
        } else {
            None
        };
        let aliases = db.load_alias_table()?;

        log_info!(
            "SESSION",
            "Loaded {} rows, {} aliases",
            table.as_ref().map(StockTable::len).unwrap_or(0),
            aliases.len()
        );

        Ok(Session {
            config,
            db,
            table,
            aliases,
            undo_slot: UndoSlot::new(),
            editor: CellEditor::new(),
            view: TableView::new(),
            upload: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Result<&StockTable, AppError> {
        self.table
            .as_ref()
            .ok_or(AppError::Storage(PersistenceError::TableMissing))
    }

    pub fn schema(&self) -> Result<&Schema, AppError> {
        Ok(self.table()?.schema())
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn editor(&self) -> &CellEditor {
        &self.editor
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    /// Rows matching the current search, in display order.
    pub fn visible_rows(&self) -> Result<Vec<&StockRow>, AppError> {
        Ok(self.view.visible_rows(self.table()?))
    }

    pub fn row_count(&self) -> Result<usize, AppError> {
        Ok(self.view.row_count(self.table()?))
    }

    pub fn set_search(&mut self, query: &str) {
        self.view.set_query(query);
    }

    /// Sorts by a column, flipping direction on a repeated call.
    pub fn toggle_sort(&mut self, column: &str) -> Result<(), AppError> {
        if !self.schema()?.has_column(column) {
            return Err(engine::EngineError::UnknownColumn(column.to_string()).into());
        }
        self.view.toggle_sort(column);
        Ok(())
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    /// Creates the stock table from a spreadsheet. Only allowed while the
    /// database has no stock table; later files go through the upload flow.
    pub fn import_stock(&mut self, path: &Path, sheet: Option<&str>) -> Result<usize, AppError> {
        log_enter!("SESSION", "import_stock", "{}", path.display());
        if self.table.is_some() {
            return Err(PersistenceError::TableExists.into());
        }

        let data = load_xlsx(path, sheet)?;
        let schema = Schema::infer(&data.headers, &data.rows, self.config.table.code_column.clone())?;
        let count = self.db.create_record_table(&schema, &data.rows)?;
        self.reload_table()?;

        log_info!(
            "SESSION",
            "Imported {} rows with {} columns from {}",
            count,
            schema.columns().len(),
            path.display()
        );
        log_exit!("SESSION", "import_stock", "{}", count);
        Ok(count)
    }

    /// Re-reads the stock table from the database.
    pub(crate) fn reload_table(&mut self) -> Result<(), AppError> {
        self.table = Some(self.db.load_table()?);
        self.invalidate_comparison();
        Ok(())
    }

    /// Stores the inverse of a write in the undo slot.
    pub(crate) fn record_undo(&mut self, action: UndoAction) {
        log_debug!(
            "UNDO",
            "Recorded '{}' ({} changes)",
            action.description,
            action.changes.len()
        );
        self.undo_slot.record(action);
    }

    pub(crate) fn invalidate_comparison(&mut self) {
        if let Some(pending) = self.upload.as_mut() {
            pending.comparison = None;
        }
    }
}
