//! FILENAME: app/src/config.rs
//! PURPOSE: Session configuration loaded from `stockbook.toml`.
//! CONTEXT: Column names are configuration, not code: the stock sheet's code
//! column, the upload's match column and which upload columns carry
//! quantities all vary between suppliers. Missing keys fall back to the
//! embedded defaults below.

use crate::error::AppError;
use engine::UploadSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration embedded in the binary
pub const DEFAULT_CONFIG: &str = r#"
[database]
path = "stockbook.db"

[logging]
path = "stockbook.log"

[table]
code_column = "KOD"
label_column = "PAKET"
location_column = "YER"

[upload]
match_column = "Value"
quantity_columns = ["Qty"]

[upload.column_map]
Qty = "MİKTAR"
"#;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub table: TableConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockbook.db"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub path: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockbook.log"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    /// Column holding the canonical code (KOD).
    pub code_column: String,
    /// Column shown beside each code in the code catalog.
    pub label_column: Option<String>,
    /// Storage location shown next to matched upload rows.
    pub location_column: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            code_column: "KOD".to_string(),
            label_column: Some("PAKET".to_string()),
            location_column: Some("YER".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub match_column: String,
    pub quantity_columns: Vec<String>,
    /// Upload column -> table column.
    pub column_map: BTreeMap<String, String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            match_column: "Value".to_string(),
            quantity_columns: vec!["Qty".to_string()],
            column_map: BTreeMap::from([("Qty".to_string(), "MİKTAR".to_string())]),
        }
    }
}

impl AppConfig {
    /// Upload settings with the default multiplier.
    pub fn upload_settings(&self) -> UploadSettings {
        let mut settings = UploadSettings::new(self.upload.match_column.clone());
        settings.quantity_columns = self.upload.quantity_columns.clone();
        settings.column_map = self.upload.column_map.clone();
        settings.location_column = self.table.location_column.clone();
        settings
    }

    /// Makes relative file paths relative to `base` instead of the working
    /// directory.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.database.path.is_relative() {
            self.database.path = base.join(&self.database.path);
        }
        if self.logging.path.is_relative() {
            self.logging.path = base.join(&self.logging.path);
        }
        self
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = toml::from_str(contents)?;
    if config.table.code_column.trim().is_empty() {
        return Err(AppError::Config("table.code_column must not be empty".to_string()));
    }
    if config.upload.match_column.trim().is_empty() {
        return Err(AppError::Config("upload.match_column must not be empty".to_string()));
    }
    Ok(config)
}

/// Load configuration from a TOML file.
///
/// Relative paths in the file resolve against the file's directory. When the
/// file does not exist the embedded default is used instead.
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return parse_config(DEFAULT_CONFIG);
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = parse_config(&contents)?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.resolve_paths(base))
}
