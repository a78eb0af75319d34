//! Kiln pipeline - task graph and build tasks
//!
//! Tasks are declared as data ([`TaskSpec`]), validated into a [`TaskGraph`]
//! and executed by a [`Runner`] against a shared [`BuildContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod fileset;
pub mod graph;
pub mod notify;
pub mod runner;
pub mod tasks;

pub use config::Config;
pub use context::BuildContext;
pub use error::{ConfigError, PipelineError, TaskError};
pub use fileset::FileSet;
pub use graph::{Action, ErrorPolicy, TaskGraph, TaskSpec};
pub use notify::{Notification, Notifier};
pub use runner::{RunReport, Runner, TaskStatus};
pub use tasks::watch::{watch_loop, WatchBinding};
