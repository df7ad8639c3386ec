//! Error taxonomy for parsing and search.
//!
//! Most of these are contained at the per-file boundary: a query over bad
//! input degrades to zero results. Only `InvalidPattern` signals a defect in
//! the built-in pattern set.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// No grammar is registered for the identifier
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A built-in pattern does not compile against its grammar
    #[error("Invalid pattern for {language}: {message}")]
    InvalidPattern { language: String, message: String },

    /// Path, revision or symbol does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// The parser itself gave up; malformed source alone never produces this
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Content is not decodable text
    #[error("Binary content: {}", .0.display())]
    Binary(PathBuf),

    /// An include or exclude glob does not compile
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

impl SearchError {
    /// Errors that only concern one file and must not abort a wider search.
    pub fn is_per_file(&self) -> bool {
        !matches!(
            self,
            SearchError::InvalidPattern { .. } | SearchError::InvalidGlob(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
