use crate::context::BuildContext;
use crate::error::TaskError;
use crate::fileset::FileSet;
use kiln_lint::{Linter, Reporter};

/// Lint the configured files; any error-severity finding fails the task
pub fn run(ctx: &BuildContext) -> Result<(), TaskError> {
    let settings = &ctx.config.lint;
    let files = FileSet::new(&settings.files).expand(&ctx.root)?;

    let mut linter = Linter::new(settings.rules.clone())?;
    let mut results = Vec::with_capacity(files.len());
    for relative in &files {
        results.push(linter.lint_file(&ctx.path(relative), relative)?);
    }

    let errors: usize = results.iter().map(|r| r.error_count()).sum();
    let warnings: usize = results.iter().map(|r| r.warning_count()).sum();
    let report = Reporter::new(settings.format).generate(&results);

    if errors > 0 {
        for line in report.lines() {
            tracing::error!("{}", line);
        }
        return Err(TaskError::LintFailed { errors, warnings });
    }

    if warnings > 0 {
        for line in report.lines() {
            tracing::warn!("{}", line);
        }
    } else {
        tracing::debug!("Linted {} file(s), no problems", files.len());
    }
    Ok(())
}
