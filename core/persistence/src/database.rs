//! FILENAME: core/persistence/src/database.rs
//! PURPOSE: SQLite storage for the stock table and the KOD alias table.
//! CONTEXT: The stock table's columns come from the imported sheet, so its
//! SQL is built at runtime with quoted identifiers. Every row gets an
//! autoincrement `row_id` that is never reused, which lets undo re-insert a
//! deleted row under its old id. Multi-row writes and reverts each run in
//! one transaction: they land completely or not at all.

use crate::PersistenceError;
use chrono::{DateTime, SecondsFormat, Utc};
use engine::{
    classify_alias, normalize_alias_key, AliasEntry, AliasInsert, AliasTable, CellValue, ColumnDef,
    ColumnType, RowChange, RowId, RowWrite, Schema, StockRecord, StockRow, StockTable, UndoAction,
};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

pub const RECORD_TABLE: &str = "stock_records";
pub const ALIAS_TABLE: &str = "kod_mappings";
pub const META_TABLE: &str = "stockbook_meta";
pub const ROW_ID_COLUMN: &str = "row_id";

const CODE_COLUMN_KEY: &str = "code_column";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {alias} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                canonical_code TEXT NOT NULL,
                alternative_value TEXT NOT NULL,
                alternative_key TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {meta} (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
            alias = ALIAS_TABLE,
            meta = META_TABLE,
        ))?;
        Ok(Self { conn })
    }

    // ========================================================================
    // STOCK TABLE
    // ========================================================================

    pub fn has_record_table(&self) -> Result<bool, PersistenceError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![RECORD_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Creates the stock table from a schema, remembers its code column and
    /// inserts the imported rows, all in one transaction. Returns the number
    /// of rows written.
    pub fn create_record_table(&mut self, schema: &Schema, rows: &[StockRecord]) -> Result<usize, PersistenceError> {
        if self.has_record_table()? {
            return Err(PersistenceError::TableExists);
        }
        if let Some(def) = schema
            .columns()
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(ROW_ID_COLUMN))
        {
            return Err(PersistenceError::InvalidFormat(format!(
                "Column name '{}' is reserved",
                def.name
            )));
        }

        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|def| format!("{} {}", quote_ident(&def.name), def.column_type.sql_name()))
            .collect();

        let tx = self.conn.transaction()?;
        tx.execute(
            &format!(
                "CREATE TABLE {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {})",
                quote_ident(RECORD_TABLE),
                quote_ident(ROW_ID_COLUMN),
                columns.join(", ")
            ),
            [],
        )?;
        tx.execute(
            &format!("INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)", META_TABLE),
            params![CODE_COLUMN_KEY, schema.code_column()],
        )?;
        for record in rows {
            insert_record(&tx, schema, record, None)?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Reads the stock table's columns back from SQLite.
    pub fn load_schema(&self) -> Result<Schema, PersistenceError> {
        if !self.has_record_table()? {
            return Err(PersistenceError::TableMissing);
        }

        let code_column: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", META_TABLE),
                params![CODE_COLUMN_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let code_column = code_column.ok_or_else(|| {
            PersistenceError::InvalidFormat("Stock table has no recorded code column".to_string())
        })?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(RECORD_TABLE)))?;
        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let declared: String = row.get(2)?;
                Ok(ColumnDef::new(name, ColumnType::from_declared(&declared)))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|def| def.name != ROW_ID_COLUMN)
            .collect();

        Schema::new(columns, code_column).map_err(|e| PersistenceError::InvalidFormat(e.to_string()))
    }

    /// Loads the schema and every row, ordered by row id.
    pub fn load_table(&self) -> Result<StockTable, PersistenceError> {
        let schema = self.load_schema()?;
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY {}", select_sql(&schema), quote_ident(ROW_ID_COLUMN)))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StockRow {
                    row_id: row.get(0)?,
                    record: read_record(&schema, row)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StockTable::new(schema, rows))
    }

    pub fn fetch_row(&self, schema: &Schema, row_id: RowId) -> Result<StockRecord, PersistenceError> {
        fetch_record(&self.conn, schema, row_id)
    }

    pub fn insert_row(&mut self, schema: &Schema, record: &StockRecord) -> Result<RowId, PersistenceError> {
        insert_record(&self.conn, schema, record, None)
    }

    /// Sets one cell and returns the row as it was before.
    pub fn update_cell(
        &mut self,
        schema: &Schema,
        row_id: RowId,
        column: &str,
        value: &CellValue,
    ) -> Result<StockRecord, PersistenceError> {
        let def = schema
            .column(column)
            .ok_or_else(|| PersistenceError::UnknownColumn(column.to_string()))?;

        let tx = self.conn.transaction()?;
        let previous = fetch_record(&tx, schema, row_id)?;
        tx.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE {} = ?2",
                quote_ident(RECORD_TABLE),
                quote_ident(&def.name),
                quote_ident(ROW_ID_COLUMN)
            ),
            params![to_sql(&def.column_type.coerce(value)), row_id],
        )?;
        tx.commit()?;
        Ok(previous)
    }

    /// Deletes a row and returns its contents.
    pub fn delete_row(&mut self, schema: &Schema, row_id: RowId) -> Result<StockRecord, PersistenceError> {
        let tx = self.conn.transaction()?;
        let previous = fetch_record(&tx, schema, row_id)?;
        remove_row(&tx, row_id)?;
        tx.commit()?;
        Ok(previous)
    }

    /// Applies comparison writes atomically and returns the undo action that
    /// reverses them.
    pub fn apply_writes(
        &mut self,
        schema: &Schema,
        writes: &[RowWrite],
        description: &str,
    ) -> Result<UndoAction, PersistenceError> {
        let mut action = UndoAction::new(description);
        let tx = self.conn.transaction()?;

        for write in writes {
            match write {
                RowWrite::Update { row_id, record } => {
                    let previous = fetch_record(&tx, schema, *row_id)?;
                    write_record(&tx, schema, *row_id, record)?;
                    action.add_change(RowChange::Updated {
                        row_id: *row_id,
                        previous,
                    });
                }
                RowWrite::Insert { record } => {
                    let row_id = insert_record(&tx, schema, record, None)?;
                    action.add_change(RowChange::Inserted { row_id });
                }
            }
        }

        tx.commit()?;
        Ok(action)
    }

    /// Reverts an action's changes, newest first, in one transaction.
    pub fn revert(&mut self, schema: &Schema, action: &UndoAction) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;

        for change in action.changes.iter().rev() {
            match change {
                RowChange::Inserted { row_id } => remove_row(&tx, *row_id)?,
                RowChange::Updated { row_id, previous } => write_record(&tx, schema, *row_id, previous)?,
                RowChange::Deleted { row_id, previous } => {
                    insert_record(&tx, schema, previous, Some(*row_id))?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // ALIASES
    // ========================================================================

    /// Stores a new mapping unless the alternative value is already mapped.
    /// Expects both values already trimmed and non-empty.
    pub fn create_alias(
        &mut self,
        canonical_code: &str,
        alternative_value: &str,
        now: DateTime<Utc>,
    ) -> Result<AliasInsert, PersistenceError> {
        let tx = self.conn.transaction()?;
        let existing = find_alias(&tx, alternative_value)?;
        if let Some(outcome) = classify_alias(existing, canonical_code) {
            return Ok(outcome);
        }
        let entry = insert_alias(&tx, canonical_code, alternative_value, now)?;
        tx.commit()?;
        Ok(AliasInsert::Created(entry))
    }

    /// Stores a mapping, dropping whatever the alternative value mapped to.
    pub fn replace_alias(
        &mut self,
        canonical_code: &str,
        alternative_value: &str,
        now: DateTime<Utc>,
    ) -> Result<AliasEntry, PersistenceError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            &format!("DELETE FROM {} WHERE alternative_key = ?1", ALIAS_TABLE),
            params![normalize_alias_key(alternative_value)],
        )?;
        let entry = insert_alias(&tx, canonical_code, alternative_value, now)?;
        tx.commit()?;
        Ok(entry)
    }

    pub fn find_alias(&self, alternative_value: &str) -> Result<Option<AliasEntry>, PersistenceError> {
        find_alias(&self.conn, alternative_value)
    }

    /// All mappings, newest first.
    pub fn list_aliases(&self) -> Result<Vec<AliasEntry>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, canonical_code, alternative_value, created_at FROM {}
             ORDER BY created_at DESC, id DESC",
            ALIAS_TABLE
        ))?;
        let rows = stmt
            .query_map([], alias_columns)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(alias_entry).collect()
    }

    pub fn delete_alias(&mut self, id: i64) -> Result<Option<AliasEntry>, PersistenceError> {
        let tx = self.conn.transaction()?;
        let existing = tx
            .query_row(
                &format!(
                    "SELECT id, canonical_code, alternative_value, created_at FROM {} WHERE id = ?1",
                    ALIAS_TABLE
                ),
                params![id],
                alias_columns,
            )
            .optional()?;
        let Some(columns) = existing else {
            return Ok(None);
        };
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", ALIAS_TABLE), params![id])?;
        tx.commit()?;
        alias_entry(columns).map(Some)
    }

    /// The whole alias table as an in-memory resolver.
    pub fn load_alias_table(&self) -> Result<AliasTable, PersistenceError> {
        Ok(AliasTable::from_entries(self.list_aliases()?))
    }
}

// ============================================================================
// SQL HELPERS
// ============================================================================

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn select_sql(schema: &Schema) -> String {
    let mut columns = vec![quote_ident(ROW_ID_COLUMN)];
    columns.extend(schema.columns().iter().map(|def| quote_ident(&def.name)));
    format!("SELECT {} FROM {}", columns.join(", "), quote_ident(RECORD_TABLE))
}

fn read_record(schema: &Schema, row: &rusqlite::Row<'_>) -> rusqlite::Result<StockRecord> {
    schema
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            let value = from_sql(row.get_ref(idx + 1)?);
            Ok((def.name.clone(), def.column_type.coerce(&value)))
        })
        .collect()
}

fn fetch_record(conn: &Connection, schema: &Schema, row_id: RowId) -> Result<StockRecord, PersistenceError> {
    conn.query_row(
        &format!("{} WHERE {} = ?1", select_sql(schema), quote_ident(ROW_ID_COLUMN)),
        params![row_id],
        |row| read_record(schema, row),
    )
    .optional()?
    .ok_or(PersistenceError::RowNotFound(row_id))
}

/// Inserts a record conformed to the schema. With `row_id` the row is
/// restored under that id instead of getting a fresh one.
fn insert_record(
    conn: &Connection,
    schema: &Schema,
    record: &StockRecord,
    row_id: Option<RowId>,
) -> Result<RowId, PersistenceError> {
    let record = schema.conform(record);
    let mut columns: Vec<String> = Vec::with_capacity(record.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(record.len() + 1);

    if let Some(id) = row_id {
        columns.push(quote_ident(ROW_ID_COLUMN));
        values.push(Value::Integer(id));
    }
    for (column, value) in record.iter() {
        columns.push(quote_ident(column));
        values.push(to_sql(value));
    }

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(RECORD_TABLE),
            columns.join(", "),
            placeholders.join(", ")
        ),
        params_from_iter(values),
    )?;

    Ok(row_id.unwrap_or_else(|| conn.last_insert_rowid()))
}

/// Overwrites every column of an existing row.
fn write_record(conn: &Connection, schema: &Schema, row_id: RowId, record: &StockRecord) -> Result<(), PersistenceError> {
    let record = schema.conform(record);
    let mut assignments: Vec<String> = Vec::with_capacity(record.len());
    let mut values: Vec<Value> = Vec::with_capacity(record.len() + 1);

    for (idx, (column, value)) in record.iter().enumerate() {
        assignments.push(format!("{} = ?{}", quote_ident(column), idx + 1));
        values.push(to_sql(value));
    }
    values.push(Value::Integer(row_id));

    let changed = conn.execute(
        &format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(RECORD_TABLE),
            assignments.join(", "),
            quote_ident(ROW_ID_COLUMN),
            values.len()
        ),
        params_from_iter(values),
    )?;

    if changed == 0 {
        return Err(PersistenceError::RowNotFound(row_id));
    }
    Ok(())
}

fn remove_row(conn: &Connection, row_id: RowId) -> Result<(), PersistenceError> {
    let changed = conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(RECORD_TABLE),
            quote_ident(ROW_ID_COLUMN)
        ),
        params![row_id],
    )?;
    if changed == 0 {
        return Err(PersistenceError::RowNotFound(row_id));
    }
    Ok(())
}

fn to_sql(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Number(n) => Value::Real(*n),
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Boolean(b) => Value::Integer(i64::from(*b)),
    }
}

fn from_sql(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Empty,
        ValueRef::Integer(i) => CellValue::Number(i as f64),
        ValueRef::Real(f) => CellValue::Number(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

// ----------------------------------------------------------------------------
// Alias rows
// ----------------------------------------------------------------------------

type AliasColumns = (i64, String, String, String);

fn alias_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<AliasColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn alias_entry((id, canonical_code, alternative_value, created_at): AliasColumns) -> Result<AliasEntry, PersistenceError> {
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|_| PersistenceError::InvalidTimestamp(created_at.clone()))?
        .with_timezone(&Utc);
    Ok(AliasEntry {
        id,
        canonical_code,
        alternative_value,
        created_at,
    })
}

fn find_alias(conn: &Connection, alternative_value: &str) -> Result<Option<AliasEntry>, PersistenceError> {
    let columns = conn
        .query_row(
            &format!(
                "SELECT id, canonical_code, alternative_value, created_at FROM {} WHERE alternative_key = ?1",
                ALIAS_TABLE
            ),
            params![normalize_alias_key(alternative_value)],
            alias_columns,
        )
        .optional()?;
    columns.map(alias_entry).transpose()
}

fn insert_alias(
    conn: &Connection,
    canonical_code: &str,
    alternative_value: &str,
    now: DateTime<Utc>,
) -> Result<AliasEntry, PersistenceError> {
    conn.execute(
        &format!(
            "INSERT INTO {} (canonical_code, alternative_value, alternative_key, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            ALIAS_TABLE
        ),
        params![
            canonical_code,
            alternative_value,
            normalize_alias_key(alternative_value),
            now.to_rfc3339_opts(SecondsFormat::Micros, true)
        ],
    )?;
    Ok(AliasEntry {
        id: conn.last_insert_rowid(),
        canonical_code: canonical_code.to_string(),
        alternative_value: alternative_value.to_string(),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn schema() -> Schema {
        Schema::new(
            vec![
                ColumnDef::new("KOD", ColumnType::Text),
                ColumnDef::new("MİKTAR", ColumnType::Integer),
                ColumnDef::new("YER", ColumnType::Text),
            ],
            "KOD",
        )
        .unwrap()
    }

    fn record(code: &str, qty: f64, yer: &str) -> StockRecord {
        let mut record = StockRecord::new();
        record.set("KOD", CellValue::text(code));
        record.set("MİKTAR", CellValue::Number(qty));
        record.set("YER", CellValue::text(yer));
        record
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.create_record_table(&schema(), &[record("A1", 5.0, "R1"), record("B2", 0.0, "R2")])
            .unwrap();
        db
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_schema_round_trip() {
        let db = seeded();
        let loaded = db.load_schema().unwrap();

        assert_eq!(loaded, schema());
        assert_eq!(loaded.code_column(), "KOD");
    }

    #[test]
    fn test_missing_and_duplicate_table() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(matches!(db.load_table(), Err(PersistenceError::TableMissing)));

        assert_eq!(db.create_record_table(&schema(), &[]).unwrap(), 0);
        assert!(matches!(
            db.create_record_table(&schema(), &[]),
            Err(PersistenceError::TableExists)
        ));
    }

    #[test]
    fn test_row_id_column_is_reserved() {
        let mut db = Database::open_in_memory().unwrap();
        let schema = Schema::new(
            vec![
                ColumnDef::new("KOD", ColumnType::Text),
                ColumnDef::new("ROW_ID", ColumnType::Integer),
            ],
            "KOD",
        )
        .unwrap();
        assert!(matches!(
            db.create_record_table(&schema, &[]),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_table_orders_rows_and_coerces() {
        let db = seeded();
        let table = db.load_table().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].row_id, 1);
        assert_eq!(table.rows()[0].record, record("A1", 5.0, "R1"));
        assert_eq!(table.rows()[1].record.get("MİKTAR"), Some(&CellValue::Number(0.0)));
    }

    #[test]
    fn test_update_cell_returns_previous() {
        let mut db = seeded();
        let previous = db
            .update_cell(&schema(), 1, "MİKTAR", &CellValue::Number(9.0))
            .unwrap();

        assert_eq!(previous, record("A1", 5.0, "R1"));
        assert_eq!(db.fetch_row(&schema(), 1).unwrap(), record("A1", 9.0, "R1"));
        assert!(matches!(
            db.update_cell(&schema(), 1, "COLOR", &CellValue::Empty),
            Err(PersistenceError::UnknownColumn(_))
        ));
        assert!(matches!(
            db.update_cell(&schema(), 42, "MİKTAR", &CellValue::Empty),
            Err(PersistenceError::RowNotFound(42))
        ));
    }

    #[test]
    fn test_apply_writes_then_revert() {
        let mut db = seeded();
        let before = db.load_table().unwrap();
        let writes = vec![
            RowWrite::Update {
                row_id: 1,
                record: record("A1", 15.0, "R1"),
            },
            RowWrite::Insert {
                record: record("C3", 2.0, ""),
            },
        ];

        let action = db.apply_writes(&schema(), &writes, "Apply upload").unwrap();
        assert_eq!(action.changes.len(), 2);
        assert_eq!(action.changes[1], RowChange::Inserted { row_id: 3 });
        assert_eq!(db.load_table().unwrap().len(), 3);

        db.revert(&schema(), &action).unwrap();
        assert_eq!(db.load_table().unwrap(), before);
    }

    #[test]
    fn test_failed_revert_leaves_no_partial_write() {
        let mut db = seeded();
        let mut action = UndoAction::new("Broken");
        action.add_change(RowChange::Inserted { row_id: 99 });
        action.add_change(RowChange::Updated {
            row_id: 1,
            previous: record("A1", 100.0, "R1"),
        });

        assert!(matches!(
            db.revert(&schema(), &action),
            Err(PersistenceError::RowNotFound(99))
        ));
        assert_eq!(db.fetch_row(&schema(), 1).unwrap(), record("A1", 5.0, "R1"));
    }

    #[test]
    fn test_failed_apply_leaves_no_partial_write() {
        let mut db = seeded();
        let writes = vec![
            RowWrite::Insert {
                record: record("C3", 1.0, "R3"),
            },
            RowWrite::Update {
                row_id: 1,
                record: record("A1", 8.0, "R1"),
            },
            RowWrite::Update {
                row_id: 99,
                record: record("Z9", 1.0, ""),
            },
        ];

        assert!(matches!(
            db.apply_writes(&schema(), &writes, "Apply upload"),
            Err(PersistenceError::RowNotFound(99))
        ));
        assert_eq!(db.fetch_row(&schema(), 1).unwrap(), record("A1", 5.0, "R1"));
        assert_eq!(db.load_table().unwrap().len(), 2);
        assert_eq!(db.insert_row(&schema(), &record("D4", 1.0, "")).unwrap(), 3);
    }

    #[test]
    fn test_deleted_row_restored_under_same_id() {
        let mut db = seeded();
        let previous = db.delete_row(&schema(), 1).unwrap();
        assert!(matches!(db.fetch_row(&schema(), 1), Err(PersistenceError::RowNotFound(1))));

        let action = UndoAction::single("Delete row", RowChange::Deleted { row_id: 1, previous });
        db.revert(&schema(), &action).unwrap();

        assert_eq!(db.fetch_row(&schema(), 1).unwrap(), record("A1", 5.0, "R1"));
        assert_eq!(db.insert_row(&schema(), &record("D4", 1.0, "")).unwrap(), 3);
    }

    #[test]
    fn test_alias_create_conflict_and_replace() {
        let mut db = Database::open_in_memory().unwrap();

        let created = db.create_alias("A1", "Alpha One", at(0)).unwrap();
        assert!(matches!(created, AliasInsert::Created(_)));

        let again = db.create_alias("A1", "alpha one ", at(1)).unwrap();
        assert!(matches!(again, AliasInsert::Unchanged(_)));

        match db.create_alias("B2", "ALPHA ONE", at(2)).unwrap() {
            AliasInsert::Conflict { existing, requested_code } => {
                assert_eq!(existing.canonical_code, "A1");
                assert_eq!(requested_code, "B2");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(db.find_alias("alpha one").unwrap().map(|e| e.canonical_code), Some("A1".to_string()));

        let replaced = db.replace_alias("B2", "ALPHA ONE", at(3)).unwrap();
        assert_eq!(replaced.created_at, at(3));
        assert_eq!(db.find_alias(" Alpha One").unwrap().map(|e| e.canonical_code), Some("B2".to_string()));
        assert_eq!(db.list_aliases().unwrap().len(), 1);
    }

    #[test]
    fn test_list_newest_first_and_delete() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_alias("A1", "first", at(0)).unwrap();
        db.create_alias("A1", "second", at(10)).unwrap();
        db.create_alias("B2", "third", at(5)).unwrap();

        let values: Vec<String> = db
            .list_aliases()
            .unwrap()
            .into_iter()
            .map(|e| e.alternative_value)
            .collect();
        assert_eq!(values, vec!["second", "third", "first"]);

        let id = db.find_alias("third").unwrap().unwrap().id;
        let removed = db.delete_alias(id).unwrap();
        assert_eq!(removed.map(|e| e.canonical_code), Some("B2".to_string()));
        assert_eq!(db.delete_alias(id).unwrap(), None);
        assert_eq!(db.load_alias_table().unwrap().len(), 2);
    }

    #[test]
    fn test_file_database_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("stock.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.create_record_table(&schema(), &[]).unwrap();
            db.insert_row(&schema(), &record("A1", 5.0, "R1")).unwrap();
            db.create_alias("A1", "alpha", at(0)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_table().unwrap().len(), 1);
        assert_eq!(db.find_alias("ALPHA").unwrap().map(|e| e.canonical_code), Some("A1".to_string()));
    }
}
