use crate::config::Config;
use crate::error::ConfigError;
use crate::notify::{FanoutNotifier, LiveReloadNotifier, LogNotifier, Notifier};
use kiln_dev_server::LiveReload;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Everything a task needs: project root, configuration and shared services
pub struct BuildContext {
    pub root: PathBuf,
    pub config: Config,
    notifier: Arc<dyn Notifier>,
    live_reload: Arc<LiveReload>,
    services: Mutex<Vec<JoinHandle<()>>>,
}

impl BuildContext {
    pub fn new(root: &Path, config: Config) -> Result<Self, ConfigError> {
        let root = root.canonicalize().map_err(|source| ConfigError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        let live_reload = Arc::new(LiveReload::new());
        let notifier: Arc<dyn Notifier> = Arc::new(FanoutNotifier::new(vec![
            Arc::new(LogNotifier),
            Arc::new(LiveReloadNotifier::new(live_reload.clone())),
        ]));

        Ok(Self {
            root,
            config,
            notifier,
            live_reload,
            services: Mutex::new(Vec::new()),
        })
    }

    /// Replace the notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Resolve a project-relative path
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn live_reload(&self) -> &Arc<LiveReload> {
        &self.live_reload
    }

    /// Keep a long-lived service (server, watcher) running
    pub fn add_service(&self, handle: JoinHandle<()>) {
        self.services().push(handle);
    }

    pub fn has_services(&self) -> bool {
        !self.services().is_empty()
    }

    pub fn take_services(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.services())
    }

    // push and take leave the list consistent even if a holder panicked
    fn services(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.services.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
