//! File watching: changed paths are mapped to tasks and re-run

use crate::error::TaskError;
use crate::fileset::{FileSet, Matcher};
use crate::runner::Runner;
use kiln_dev_server::FileWatcher;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Paths that re-run a task when they change
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub task: String,
    pub files: FileSet,
}

impl WatchBinding {
    pub fn new(task: impl Into<String>, files: FileSet) -> Self {
        Self {
            task: task.into(),
            files,
        }
    }
}

/// Register watchers for the configured script and style paths
pub fn start(runner: &Runner) -> Result<(), TaskError> {
    let ctx = runner.context();
    let settings = &ctx.config.watch;
    let bindings = vec![
        WatchBinding::new("concat", FileSet::new(&settings.scripts)),
        WatchBinding::new("sass", FileSet::new(&settings.styles)),
    ];

    let roots: Vec<PathBuf> = FileSet::new(bindings.iter().flat_map(|b| b.files.patterns().to_vec()))
        .roots()
        .into_iter()
        .map(|root| ctx.path(root))
        .collect();

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = FileWatcher::new(&roots, tx).map_err(TaskError::Watch)?;
    for binding in &bindings {
        tracing::info!("Watching {} for '{}'", binding.files.patterns().join(", "), binding.task);
    }

    let loop_runner = runner.clone();
    let handle = tokio::spawn(async move {
        // dropping the watcher ends the watch
        let _watcher = watcher;
        if let Err(e) = watch_loop(loop_runner, bindings, rx).await {
            tracing::error!("Watch stopped: {}", e);
        }
    });
    ctx.add_service(handle);
    Ok(())
}

/// Re-run bound tasks for changed paths until the channel closes
///
/// Paths received while a task runs are collected and handled afterwards,
/// so each task runs at most once per batch. A failed run is logged and
/// the loop carries on.
pub async fn watch_loop(
    runner: Runner,
    bindings: Vec<WatchBinding>,
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
) -> Result<(), TaskError> {
    let mut matchers: Vec<(String, Matcher)> = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        matchers.push((binding.task.clone(), binding.files.matcher()?));
    }
    let root = runner.context().root.clone();

    while let Some(path) = rx.recv().await {
        let mut queue: Vec<String> = Vec::new();
        enqueue(&mut queue, &matchers, &root, &path);
        drain(&mut queue, &matchers, &root, &mut rx);

        while !queue.is_empty() {
            let task = queue.remove(0);
            match runner.run(&task).await {
                Ok(report) => tracing::debug!("'{}' re-ran {} task(s)", task, report.tasks.len()),
                Err(e) => tracing::error!("{}", e),
            }
            drain(&mut queue, &matchers, &root, &mut rx);
        }
    }

    tracing::debug!("Watch channel closed");
    Ok(())
}

fn drain(
    queue: &mut Vec<String>,
    matchers: &[(String, Matcher)],
    root: &Path,
    rx: &mut mpsc::UnboundedReceiver<PathBuf>,
) {
    while let Ok(path) = rx.try_recv() {
        enqueue(queue, matchers, root, &path);
    }
}

fn enqueue(queue: &mut Vec<String>, matchers: &[(String, Matcher)], root: &Path, path: &Path) {
    let relative = path.strip_prefix(root).unwrap_or(path);
    for (task, matcher) in matchers {
        if matcher.matches(relative) && !queue.contains(task) {
            tracing::info!("{} changed, queueing '{}'", relative.display(), task);
            queue.push(task.clone());
        }
    }
}
