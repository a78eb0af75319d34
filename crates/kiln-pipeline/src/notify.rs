//! Error notifications for recoverable task failures

use crate::config::NotifySettings;
use kiln_dev_server::LiveReload;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Fill the configured template; `{error}` becomes the error message
    pub fn from_error(settings: &NotifySettings, error: &dyn Display) -> Self {
        Self {
            title: settings.title.clone(),
            message: settings.message.replace("{error}", &error.to_string()),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::error!("{}: {}", notification.title, notification.message);
    }
}

/// Shows notifications in connected browsers
pub struct LiveReloadNotifier {
    live_reload: Arc<LiveReload>,
}

impl LiveReloadNotifier {
    pub fn new(live_reload: Arc<LiveReload>) -> Self {
        Self { live_reload }
    }
}

impl Notifier for LiveReloadNotifier {
    fn notify(&self, notification: &Notification) {
        self.live_reload
            .error(notification.title.clone(), notification.message.clone());
    }
}

/// Delivers to several notifiers in order
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, notification: &Notification) {
        for notifier in &self.notifiers {
            notifier.notify(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_dev_server::LiveReloadMessage;

    #[test]
    fn test_template_interpolation() {
        let settings = NotifySettings {
            title: "Sass".to_string(),
            message: "Build failed: {error}".to_string(),
        };
        let notification = Notification::from_error(&settings, &"main.scss: expected \";\"");
        assert_eq!(notification.title, "Sass");
        assert_eq!(notification.message, "Build failed: main.scss: expected \";\"");
    }

    #[test]
    fn test_fanout_reaches_browser() {
        let live_reload = Arc::new(LiveReload::new());
        let mut rx = live_reload.subscribe();
        let notifier = FanoutNotifier::new(vec![
            Arc::new(LogNotifier),
            Arc::new(LiveReloadNotifier::new(live_reload.clone())),
        ]);

        notifier.notify(&Notification {
            title: "Error".to_string(),
            message: "boom".to_string(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            LiveReloadMessage::Error {
                title: "Error".to_string(),
                message: "boom".to_string()
            }
        );
    }
}
