//! Error type for the linter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lint operations
pub type Result<T> = std::result::Result<T, LintError>;

#[derive(Error, Debug)]
pub enum LintError {
    /// Grammar could not be loaded into the parser
    #[error("Tree-sitter language error: {0}")]
    TreeSitterLanguage(#[from] tree_sitter::LanguageError),

    /// The parser gave up without producing a tree
    #[error("Parser error in {}: {message}", path.display())]
    Parser { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LintError {
    pub fn parser(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parser {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
