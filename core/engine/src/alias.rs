//! FILENAME: core/engine/src/alias.rs
//! PURPOSE: KOD aliases: alternative values that refer to a canonical code.
//! CONTEXT: Supplier files rarely use our own codes. An alias table maps the
//! values found in uploads onto KODs. Lookups are keyed by the normalized
//! alternative value (trimmed, lowercased) so that spreadsheet formatting
//! differences do not defeat a known mapping. `AliasTable` is the in-memory
//! form; the database keeps the same invariants through `classify_alias`.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lookup key for an alternative value.
pub fn normalize_alias_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub id: i64,
    pub canonical_code: String,
    pub alternative_value: String,
    pub created_at: DateTime<Utc>,
}

impl AliasEntry {
    pub fn key(&self) -> String {
        normalize_alias_key(&self.alternative_value)
    }
}

/// Anything that can turn an alternative value into a canonical code.
pub trait AliasResolver {
    fn resolve(&self, alternative_value: &str) -> Option<String>;
}

/// Outcome of creating a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasInsert {
    /// A new mapping was stored.
    Created(AliasEntry),
    /// The same mapping already existed; nothing changed.
    Unchanged(AliasEntry),
    /// The alternative value already maps to a different code. The existing
    /// mapping is left in place until the caller replaces it explicitly.
    Conflict {
        existing: AliasEntry,
        requested_code: String,
    },
}

/// Decides how a requested mapping relates to the stored one.
/// Returns None while the alternative value is still free.
pub fn classify_alias(existing: Option<AliasEntry>, canonical_code: &str) -> Option<AliasInsert> {
    match existing {
        None => None,
        Some(entry) if entry.canonical_code == canonical_code => Some(AliasInsert::Unchanged(entry)),
        Some(entry) => Some(AliasInsert::Conflict {
            existing: entry,
            requested_code: canonical_code.to_string(),
        }),
    }
}

/// Trims both sides of a mapping request and rejects blanks.
pub fn clean_alias_pair(canonical_code: &str, alternative_value: &str) -> Result<(String, String), EngineError> {
    let code = canonical_code.trim();
    let alternative = alternative_value.trim();
    if code.is_empty() {
        return Err(EngineError::EmptyField("Original KOD".to_string()));
    }
    if alternative.is_empty() {
        return Err(EngineError::EmptyField("Alternative value".to_string()));
    }
    Ok((code.to_string(), alternative.to_string()))
}

/// In-memory alias store. Used as the session's lookup cache.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_key: HashMap<String, AliasEntry>,
    next_id: i64,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from stored entries. Should two entries share a key,
    /// the more recently created one wins.
    pub fn from_entries(entries: impl IntoIterator<Item = AliasEntry>) -> Self {
        let mut table = Self::new();
        let mut entries: Vec<AliasEntry> = entries.into_iter().collect();
        entries.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        for entry in entries {
            table.upsert(entry);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn get(&self, alternative_value: &str) -> Option<&AliasEntry> {
        self.by_key.get(&normalize_alias_key(alternative_value))
    }

    /// Creates a mapping unless the alternative value already maps elsewhere.
    pub fn create(
        &mut self,
        canonical_code: &str,
        alternative_value: &str,
        now: DateTime<Utc>,
    ) -> Result<AliasInsert, EngineError> {
        let (code, alternative) = clean_alias_pair(canonical_code, alternative_value)?;
        if let Some(outcome) = classify_alias(self.get(&alternative).cloned(), &code) {
            return Ok(outcome);
        }
        let entry = self.new_entry(code, alternative, now);
        self.upsert(entry.clone());
        Ok(AliasInsert::Created(entry))
    }

    /// Stores a mapping, overwriting whatever the alternative value mapped to.
    pub fn replace(
        &mut self,
        canonical_code: &str,
        alternative_value: &str,
        now: DateTime<Utc>,
    ) -> Result<AliasEntry, EngineError> {
        let (code, alternative) = clean_alias_pair(canonical_code, alternative_value)?;
        let entry = self.new_entry(code, alternative, now);
        self.upsert(entry.clone());
        Ok(entry)
    }

    /// Inserts an entry as-is, replacing any entry with the same key.
    pub fn upsert(&mut self, entry: AliasEntry) {
        self.next_id = self.next_id.max(entry.id);
        self.by_key.insert(entry.key(), entry);
    }

    pub fn remove(&mut self, id: i64) -> Option<AliasEntry> {
        let key = self
            .by_key
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(key, _)| key.clone())?;
        self.by_key.remove(&key)
    }

    /// All mappings, newest first.
    pub fn list_all(&self) -> Vec<AliasEntry> {
        let mut entries: Vec<AliasEntry> = self.by_key.values().cloned().collect();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        entries
    }

    fn new_entry(&mut self, canonical_code: String, alternative_value: String, now: DateTime<Utc>) -> AliasEntry {
        self.next_id += 1;
        AliasEntry {
            id: self.next_id,
            canonical_code,
            alternative_value,
            created_at: now,
        }
    }
}

impl AliasResolver for AliasTable {
    fn resolve(&self, alternative_value: &str) -> Option<String> {
        self.get(alternative_value).map(|entry| entry.canonical_code.clone())
    }
}
