//! Error types for the `tagscript` command.

use std::path::PathBuf;
use tagscript_parser::TagScriptError;
use thiserror::Error;

/// Everything that makes the command exit with a failure status.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading, decoding or parsing the input failed.
    #[error(transparent)]
    TagScript(#[from] TagScriptError),

    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to print diagnostics: {0}")]
    Report(#[source] std::io::Error),

    #[error("validation failed with {errors} error(s)")]
    Validation { errors: usize },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}
