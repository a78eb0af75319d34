use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;

/// Recursive watcher over a set of directories
///
/// Create, modify and remove events are forwarded as absolute paths. The
/// watch stops when this value is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl FileWatcher {
    pub fn new(roots: &[PathBuf], tx: mpsc::UnboundedSender<PathBuf>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_change(&event.kind) {
                    return;
                }
                for path in event.paths {
                    if should_ignore(&path) {
                        continue;
                    }
                    tracing::trace!("Change detected: {}", path.display());
                    // Receiver gone means the watch loop ended
                    let _ = tx.send(path);
                }
            }
            Err(e) => tracing::warn!("Watch error: {}", e),
        })?;

        let mut watched = Vec::new();
        for root in roots {
            if !root.is_dir() {
                tracing::warn!("Not watching {}: directory does not exist", root.display());
                continue;
            }
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", root.display()))?;
            tracing::debug!("Watching {}", root.display());
            watched.push(root.clone());
        }

        Ok(Self {
            _watcher: watcher,
            roots: watched,
        })
    }

    /// Directories actually being watched
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Check if path should be ignored
fn should_ignore(path: &Path) -> bool {
    const IGNORE_DIRS: &[&str] = &["node_modules", ".git", ".sass-cache"];

    let in_ignored_dir = path.components().any(|c| match c {
        Component::Normal(name) => IGNORE_DIRS.iter().any(|d| name == *d),
        _ => false,
    });

    // editor swap and backup files
    let temp_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with('~') || n.ends_with(".swp") || n.starts_with(".#") || n == ".DS_Store");

    in_ignored_dir || temp_file
}
