//! FILENAME: app/src/error.rs

use engine::EngineError;
use persistence::PersistenceError;
use thiserror::Error;

/// User-facing error kinds.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input; shown next to the field, nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The alternative value already maps to another code. Call
    /// `replace_alias` to overwrite after the user confirms.
    #[error("'{alternative_value}' is already mapped to '{existing_code}' (requested '{requested_code}')")]
    AliasConflict {
        alternative_value: String,
        existing_code: String,
        requested_code: String,
    },

    #[error("Nothing to undo")]
    NoPendingAction,

    #[error("No upload is loaded")]
    NoUpload,

    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NoPendingAction => AppError::NoPendingAction,
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}
