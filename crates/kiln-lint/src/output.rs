//! Output formatters for lint results

use crate::diagnostic::DiagnosticSeverity;
use crate::FileResult;
use serde::{Deserialize, Serialize};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Stylish,
}

/// Reporter for generating output
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn generate(&self, results: &[FileResult]) -> String {
        match self.format {
            OutputFormat::Json => self.generate_json(results),
            OutputFormat::Stylish => self.generate_stylish(results),
        }
    }

    fn generate_json(&self, results: &[FileResult]) -> String {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            files: Vec<JsonFile<'a>>,
            summary: JsonSummary,
        }

        #[derive(Serialize)]
        struct JsonFile<'a> {
            path: String,
            diagnostics: &'a [crate::Diagnostic],
        }

        #[derive(Serialize)]
        struct JsonSummary {
            files_checked: usize,
            files_with_issues: usize,
            total_errors: usize,
            total_warnings: usize,
        }

        let files: Vec<JsonFile> = results
            .iter()
            .map(|r| JsonFile {
                path: r.path.to_string_lossy().to_string(),
                diagnostics: &r.diagnostics,
            })
            .collect();

        let output = JsonOutput {
            files,
            summary: JsonSummary {
                files_checked: results.len(),
                files_with_issues: results.iter().filter(|r| !r.diagnostics.is_empty()).count(),
                total_errors: results.iter().map(FileResult::error_count).sum(),
                total_warnings: results.iter().map(FileResult::warning_count).sum(),
            },
        };

        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn generate_stylish(&self, results: &[FileResult]) -> String {
        let mut output = String::new();
        let mut total_errors = 0;
        let mut total_warnings = 0;

        for result in results {
            for diag in &result.diagnostics {
                match diag.severity {
                    DiagnosticSeverity::Error => total_errors += 1,
                    DiagnosticSeverity::Warning => total_warnings += 1,
                }

                output.push_str(&format!(
                    "{}:{}:{}: {} [{}]: {}\n",
                    result.path.display(),
                    diag.range.start.line + 1,
                    diag.range.start.character + 1,
                    diag.severity.as_str(),
                    diag.rule,
                    diag.message
                ));
            }
        }

        if total_errors > 0 || total_warnings > 0 {
            output.push_str(&format!(
                "\n{} problem(s) ({} error(s), {} warning(s))\n",
                total_errors + total_warnings,
                total_errors,
                total_warnings
            ));
        }

        output
    }
}
