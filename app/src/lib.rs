//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point for the stock session.
// CONTEXT: Wires the engine to persistence. A front end creates one
// `Session` per open database and calls its operations directly.

pub mod alias_commands;
pub mod api_types;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod table_commands;
pub mod undo_commands;
pub mod upload_commands;

pub use api_types::{ApplySummary, UndoResult, UndoState, UploadComparison};
pub use config::{load_config, AppConfig, DEFAULT_CONFIG};
pub use error::AppError;
pub use logging::{get_log_path, init_log_file, next_seq, write_log};
pub use session::{PendingUpload, Session};

use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "stockbook.toml";

/// Loads configuration, opens the log file and the database.
pub fn run(config_path: &Path) -> Result<Session, AppError> {
    let config = load_config(config_path)?;
    init_log_file(&config.logging.path)
        .map_err(|e| AppError::Config(format!("Failed to open log file: {}", e)))?;
    logging::log_info!("SESSION", "Using configuration {}", config_path.display());

    Session::open(config)
}
