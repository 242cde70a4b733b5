//! # Search Error Types
//!
//! Errors returned when ranking related pages.

use crate::error::Error as CrateError;
use thiserror::Error;

/// Errors that can occur during similarity search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The target URL has no embedding in the current set
    #[error("URL not found in processed pages: {0}")]
    UrlNotFound(String),

    /// Invalid search parameters
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        CrateError::Search(err.to_string())
    }
}
