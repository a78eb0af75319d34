use kiln_lint::LintError;
use kiln_transform::TransformError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Project root {} is not accessible: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure inside one task's action
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{errors} lint error(s), {warnings} warning(s)")]
    LintFailed { errors: usize, warnings: usize },

    #[error(transparent)]
    Lint(#[from] LintError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Watch failed: {0:#}")]
    Watch(anyhow::Error),

    #[error("Dev server failed: {0:#}")]
    Server(anyhow::Error),

    #[error("Task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task defined twice: {0}")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Dependency cycle involving task '{0}'")]
    Cycle(String),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: TaskError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failed_message() {
        let err = PipelineError::TaskFailed {
            task: "eslint".to_string(),
            source: TaskError::LintFailed {
                errors: 2,
                warnings: 1,
            },
        };
        assert_eq!(
            err.to_string(),
            "Task 'eslint' failed: 2 lint error(s), 1 warning(s)"
        );
    }

    #[test]
    fn test_io_error_names_path() {
        let err = TaskError::io(
            "assets/js/app.js",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "assets/js/app.js: denied");
    }
}
