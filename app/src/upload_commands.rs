//! FILENAME: app/src/upload_commands.rs
//! PURPOSE: The upload flow: stage a supplier file, compare it with the
//! stock table, then apply the result in one transaction.
//! CONTEXT: The staged rows stay as read. Changing the multiplier only
//! changes the settings, and each comparison normalizes the raw rows again,
//! so quantities are scaled exactly once per comparison.

use crate::api_types::{ApplySummary, UploadComparison};
use crate::error::AppError;
use crate::logging::{log_debug, log_enter, log_exit, log_info, log_warn};
use crate::session::{PendingUpload, Session};
use engine::{compare, normalize, Multiplier, RowId, Upload};
use persistence::{load_xlsx, PersistenceError};
use std::path::Path;

impl Session {
    /// Reads a supplier file and stages it. Returns the number of rows.
    pub fn load_upload(&mut self, path: &Path, sheet: Option<&str>) -> Result<usize, AppError> {
        log_info!("UPLOAD", "Loading {}", path.display());
        let upload = load_xlsx(path, sheet)?.into_upload();
        self.stage_upload(upload)
    }

    /// Stages rows that were read elsewhere.
    pub fn stage_upload(&mut self, upload: Upload) -> Result<usize, AppError> {
        let settings = self.config.upload_settings();
        if !upload.has_column(&settings.match_column) {
            return Err(AppError::Validation(format!(
                "Upload has no '{}' column",
                settings.match_column
            )));
        }

        let rows = upload.rows.len();
        self.upload = Some(PendingUpload {
            upload,
            settings,
            comparison: None,
        });
        log_info!("UPLOAD", "Staged {} rows", rows);
        Ok(rows)
    }

    pub fn pending_upload(&self) -> Option<&PendingUpload> {
        self.upload.as_ref()
    }

    pub fn discard_upload(&mut self) {
        if self.upload.take().is_some() {
            log_debug!("UPLOAD", "Discarded staged upload");
        }
    }

    /// Sets the quantity multiplier from user input. Blank means 1.
    pub fn set_multiplier(&mut self, input: &str) -> Result<Multiplier, AppError> {
        let multiplier: Multiplier = input.parse()?;
        let pending = self.upload.as_mut().ok_or(AppError::NoUpload)?;
        pending.settings.multiplier = multiplier;
        pending.comparison = None;
        log_info!("UPLOAD", "Quantity multiplier set to {}", multiplier.value());
        Ok(multiplier)
    }

    /// Compares the staged upload with the current table and aliases.
    pub fn compare_upload(&mut self) -> Result<&UploadComparison, AppError> {
        let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
        let pending = self.upload.as_mut().ok_or(AppError::NoUpload)?;

        if pending.comparison.is_none() {
            let normalized = normalize(
                &pending.upload,
                &pending.settings,
                &table.code_index(),
                &self.aliases,
            );
            if !normalized.skipped_quantities.is_empty() {
                log_warn!(
                    "UPLOAD",
                    "Quantity left unchanged in rows {:?}: blank or not a number",
                    normalized.skipped_quantities
                );
            }

            let result = compare(&normalized.rows, table, &pending.settings);
            let kept = result.kept_quantity_codes();
            if !kept.is_empty() {
                log_warn!("UPLOAD", "Stored quantity is not a number, left unchanged for {:?}", kept);
            }
            log_info!(
                "UPLOAD",
                "Compared: {} matched, {} new, {} unmatched",
                result.matched.len(),
                result.inserts.len(),
                result.unmatched.len()
            );
            pending.comparison = Some(UploadComparison {
                result,
                skipped_quantities: normalized.skipped_quantities,
            });
        }

        pending
            .comparison
            .as_ref()
            .ok_or(AppError::NoUpload)
    }

    /// Writes every update and insert of the comparison in one transaction
    /// and records them as a single undo action. Unmatched rows are left out
    /// and reported. The staged upload is cleared afterwards.
    pub fn apply_upload(&mut self) -> Result<ApplySummary, AppError> {
        log_enter!("UPLOAD", "apply_upload");
        let comparison = self.compare_upload()?.clone();
        let writes = comparison.result.writes();

        let unmatched = comparison.result.unmatched_values();
        if !unmatched.is_empty() {
            log_warn!("UPLOAD", "{} values still need an alias: {:?}", unmatched.len(), unmatched);
        }

        let summary = ApplySummary {
            updated: comparison.result.matched.iter().filter(|m| m.is_change()).count(),
            inserted: comparison.result.inserts.len(),
            unmatched,
            skipped_quantities: comparison.skipped_quantities,
            kept_quantities: comparison.result.kept_quantity_codes(),
        };

        if !writes.is_empty() {
            let table = self.table.as_ref().ok_or(PersistenceError::TableMissing)?;
            let action = self.db.apply_writes(table.schema(), &writes, "Apply upload")?;
            self.record_undo(action);
            self.reload_table()?;
        }

        self.upload = None;
        log_info!(
            "UPLOAD",
            "Applied upload: {} updated, {} inserted",
            summary.updated,
            summary.inserted
        );
        log_exit!("UPLOAD", "apply_upload");
        Ok(summary)
    }

    /// Row holding the code an uploaded value refers to, directly or
    /// through an alias.
    pub fn locate_value(&self, raw_value: &str) -> Result<Option<RowId>, AppError> {
        let index = self.table()?.code_index();
        let value = raw_value.trim();
        if let Some(row) = index.get(value) {
            return Ok(Some(row.row_id));
        }
        Ok(self
            .aliases
            .get(value)
            .and_then(|entry| index.get(entry.canonical_code.trim()))
            .map(|row| row.row_id))
    }
}
