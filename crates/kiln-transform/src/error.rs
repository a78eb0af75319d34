use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Error, Debug)]
pub enum TransformError {
    /// Syntax error in a script; line and column are 1-based
    #[error("{file}: SyntaxError: {message} ({line}:{column})")]
    Syntax {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{file}: failed to print transpiled code: {message}")]
    Emit { file: String, message: String },

    #[error("{file}: source map: {message}")]
    SourceMap { file: String, message: String },

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("{file}: {message}")]
    Sass { file: String, message: String },

    #[error("{file}: {message}")]
    Css { file: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn syntax(file: impl Into<String>, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn emit(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Emit {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn source_map(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceMap {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn sass(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sass {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn css(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Css {
            file: file.into(),
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
