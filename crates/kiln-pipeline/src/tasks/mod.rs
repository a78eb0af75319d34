//! Task actions

pub mod concat;
pub mod copy;
pub mod lint;
pub mod sass;
pub mod serve;
pub mod watch;

use crate::error::TaskError;
use crate::graph::Action;
use crate::runner::Runner;
use std::fs;
use std::path::Path;

pub(crate) async fn execute(runner: &Runner, action: &Action) -> Result<(), TaskError> {
    let ctx = runner.context().clone();
    match action {
        Action::None => Ok(()),
        Action::Lint => blocking(move || lint::run(&ctx)).await,
        Action::CopyNewer(entry) => {
            let entry = entry.clone();
            blocking(move || copy::copy_newer(&ctx, &entry)).await
        }
        Action::CopyComponents => blocking(move || copy::copy_components(&ctx)).await,
        Action::Concat => blocking(move || concat::run(&ctx)).await,
        Action::Sass => blocking(move || sass::run(&ctx)).await,
        Action::Watch => watch::start(runner),
        Action::Serve => serve::start(&ctx).await,
    }
}

async fn blocking<F>(f: F) -> Result<(), TaskError>
where
    F: FnOnce() -> Result<(), TaskError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Write a file, creating its directory first
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| TaskError::io(path, e))
}
