//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the stock engine.
//! CONTEXT: Pure in-memory logic: records and schema, the alias table, the
//! upload normalizer and comparison engine, the undo slot, the cell editor
//! and the table view. Nothing here touches the disk.

pub mod alias;
pub mod comparison;
pub mod editor;
pub mod error;
pub mod normalizer;
pub mod record;
pub mod schema;
pub mod table;
pub mod undo;
pub mod value;
pub mod view;

// Re-export commonly used types at the crate root
pub use alias::{classify_alias, clean_alias_pair, normalize_alias_key, AliasEntry, AliasInsert, AliasResolver, AliasTable};
pub use comparison::{compare, ComparisonResult, MatchedRow, NewRow, StockCheck, UnmatchedRow};
pub use editor::{ActiveEdit, CellEdit, CellEditor, CommitOutcome, EditState};
pub use error::EngineError;
pub use normalizer::{normalize, Multiplier, Normalized, NormalizedRow, Resolution, ResolvedCode, Upload, UploadSettings};
pub use record::{RowId, StockRecord};
pub use schema::{ColumnDef, ColumnType, Schema};
pub use table::{CodeIndex, RowWrite, StockRow, StockTable};
pub use undo::{RowChange, UndoAction, UndoSlot};
pub use value::CellValue;
pub use view::{code_catalog, filter_catalog, CodeLabel, SortKey, TableView};
