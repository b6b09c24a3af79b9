//! FILENAME: app/src/alias_commands.rs
// PURPOSE: KOD alias management and the code catalog used to pick a target.

use crate::error::AppError;
use crate::logging::{log_info, log_warn};
use crate::session::Session;
use chrono::Utc;
use engine::{clean_alias_pair, code_catalog, filter_catalog, AliasEntry, AliasInsert, AliasResolver, CodeLabel};

impl Session {
    /// Maps an alternative value to a code. Fails with `AliasConflict` when
    /// the value already maps to a different code; the stored mapping is
    /// then left untouched.
    pub fn create_alias(&mut self, canonical_code: &str, alternative_value: &str) -> Result<AliasEntry, AppError> {
        let (code, alternative) = clean_alias_pair(canonical_code, alternative_value)?;
        let code = self.stored_code(code);

        match self.db.create_alias(&code, &alternative, Utc::now())? {
            AliasInsert::Created(entry) => {
                log_info!("ALIAS", "'{}' -> '{}'", entry.alternative_value, entry.canonical_code);
                self.aliases.upsert(entry.clone());
                self.invalidate_comparison();
                Ok(entry)
            }
            AliasInsert::Unchanged(entry) => Ok(entry),
            AliasInsert::Conflict {
                existing,
                requested_code,
            } => {
                log_warn!(
                    "ALIAS",
                    "'{}' already maps to '{}', requested '{}'",
                    existing.alternative_value,
                    existing.canonical_code,
                    requested_code
                );
                Err(AppError::AliasConflict {
                    alternative_value: existing.alternative_value,
                    existing_code: existing.canonical_code,
                    requested_code,
                })
            }
        }
    }

    /// Overwrites whatever the alternative value mapped to.
    pub fn replace_alias(&mut self, canonical_code: &str, alternative_value: &str) -> Result<AliasEntry, AppError> {
        let (code, alternative) = clean_alias_pair(canonical_code, alternative_value)?;
        let code = self.stored_code(code);
        let entry = self.db.replace_alias(&code, &alternative, Utc::now())?;

        log_info!("ALIAS", "Replaced: '{}' -> '{}'", entry.alternative_value, entry.canonical_code);
        self.aliases.upsert(entry.clone());
        self.invalidate_comparison();
        Ok(entry)
    }

    pub fn delete_alias(&mut self, id: i64) -> Result<AliasEntry, AppError> {
        let entry = self
            .db
            .delete_alias(id)?
            .ok_or_else(|| AppError::Validation(format!("No alias with id {}", id)))?;

        log_info!("ALIAS", "Deleted '{}' -> '{}'", entry.alternative_value, entry.canonical_code);
        self.aliases.remove(id);
        self.invalidate_comparison();
        Ok(entry)
    }

    /// Every mapping, newest first.
    pub fn list_aliases(&self) -> Result<Vec<AliasEntry>, AppError> {
        Ok(self.db.list_aliases()?)
    }

    pub fn resolve_alias(&self, alternative_value: &str) -> Option<String> {
        self.aliases.resolve(alternative_value)
    }

    /// The code as the table spells it. Direct matching is case-sensitive,
    /// so an alias to `a1` would miss a stored `A1`. Codes not in the table
    /// are kept; applying an upload through them inserts a new row.
    fn stored_code(&self, code: String) -> String {
        let Some(table) = self.table.as_ref() else {
            return code;
        };
        match table.code_index().stored_spelling(&code) {
            Some(stored) => {
                if stored != code {
                    log_info!("ALIAS", "Using stored code '{}' for '{}'", stored, code);
                }
                stored
            }
            None => {
                log_warn!("ALIAS", "Code '{}' is not in the stock table", code);
                code
            }
        }
    }

    /// Codes in the table with their label column, filtered by `query`.
    pub fn code_catalog(&self, query: &str) -> Result<Vec<CodeLabel>, AppError> {
        let catalog = code_catalog(self.table()?, self.config.table.label_column.as_deref());
        Ok(filter_catalog(&catalog, query).into_iter().cloned().collect())
    }
}
