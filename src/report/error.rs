//! Error types for the report module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for display and export
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Terminal or file write error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExportError> for CrateError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => CrateError::Io(e),
            ExportError::Json(e) => CrateError::Json(e),
            ExportError::Csv(e) => CrateError::Export(e.to_string()),
        }
    }
}
