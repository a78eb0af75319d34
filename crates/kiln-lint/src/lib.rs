//! Kiln lint - JavaScript/JSX static analysis
//!
//! Parses each file with the tree-sitter JavaScript grammar (JSX included)
//! and runs a small ESLint-compatible rule set. Report-only: nothing is fixed.

pub mod diagnostic;
pub mod error;
pub mod output;
pub mod parser;
pub mod rules;

pub use diagnostic::{Diagnostic, DiagnosticSeverity, Position, Range};
pub use error::{LintError, Result};
pub use output::{OutputFormat, Reporter};
pub use parser::{JsParser, ParsedFile};
pub use rules::{RuleConfig, RuleLevel};

use std::path::{Path, PathBuf};

/// Lint result for one file
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .count()
    }
}

/// Linter holding a parser and the active rule configuration
pub struct Linter {
    parser: JsParser,
    rules: RuleConfig,
}

impl Linter {
    pub fn new(rules: RuleConfig) -> Result<Self> {
        Ok(Self {
            parser: JsParser::new()?,
            rules,
        })
    }

    /// Lint in-memory source; `path` is only used for reporting
    pub fn lint_source(&mut self, path: &Path, source: &str) -> Result<FileResult> {
        let parsed = self.parser.parse(path, source)?;
        let diagnostics = rules::check(&parsed, &self.rules);
        tracing::debug!("Linted {} ({} finding(s))", path.display(), diagnostics.len());

        Ok(FileResult {
            path: path.to_path_buf(),
            diagnostics,
        })
    }

    /// Read and lint a file; `display_path` names it in the report
    pub fn lint_file(&mut self, path: &Path, display_path: &Path) -> Result<FileResult> {
        let source = std::fs::read_to_string(path).map_err(|e| LintError::io(path, e))?;
        self.lint_source(display_path, &source)
    }
}
