//! Concurrent task runner
//!
//! A run expands the target into its plan, starts every task whose
//! prerequisites are done and polls them together. File work happens on the
//! blocking pool. A task never overlaps with itself: a second run that
//! reaches a task already running waits for it to finish.

use crate::context::BuildContext;
use crate::error::{PipelineError, TaskError};
use crate::graph::{ErrorPolicy, TaskGraph, TaskId};
use crate::notify::Notification;
use crate::tasks;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    /// Failed under [`ErrorPolicy::ReportAndContinue`]; counted as complete
    Recovered,
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub name: String,
    pub status: TaskStatus,
    pub elapsed: Duration,
}

/// Tasks completed by one run, in completion order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tasks: Vec<TaskRecord>,
}

impl RunReport {
    pub fn status(&self, name: &str) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.name == name).map(|t| t.status)
    }

    pub fn ran(&self, name: &str) -> bool {
        self.status(name).is_some()
    }
}

/// Runs targets of a task graph; cheap to clone
#[derive(Clone)]
pub struct Runner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    graph: TaskGraph,
    ctx: Arc<BuildContext>,
    running: HashMap<TaskId, Mutex<()>>,
}

type TaskOutcome = (TaskId, Duration, Result<TaskStatus, TaskError>);

impl Runner {
    pub fn new(graph: TaskGraph, ctx: Arc<BuildContext>) -> Self {
        let running = graph
            .tasks()
            .filter_map(|spec| graph.get(&spec.name))
            .map(|id| (id, Mutex::new(())))
            .collect();
        Self {
            inner: Arc::new(RunnerInner {
                graph,
                ctx,
                running,
            }),
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.inner.graph
    }

    pub fn context(&self) -> &Arc<BuildContext> {
        &self.inner.ctx
    }

    /// Run `target` and everything it needs
    ///
    /// On a fatal failure nothing new is started; tasks already running are
    /// awaited before the error is returned.
    pub fn run<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<RunReport, PipelineError>> {
        Box::pin(async move {
            let graph = self.graph();
            let plan = graph.plan(target)?;
            tracing::debug!("Running '{}' ({} task(s))", target, plan.order.len());

            let mut remaining: HashMap<TaskId, usize> = plan
                .order
                .iter()
                .map(|&id| (id, plan.waits_on.get(&id).map_or(0, Vec::len)))
                .collect();
            let mut ready: VecDeque<TaskId> = plan
                .order
                .iter()
                .copied()
                .filter(|id| remaining.get(id) == Some(&0))
                .collect();

            let mut in_flight = FuturesUnordered::new();
            let mut report = RunReport::default();
            let mut failure: Option<PipelineError> = None;

            loop {
                if failure.is_none() {
                    while let Some(id) = ready.pop_front() {
                        in_flight.push(self.run_task(id));
                    }
                }

                let Some((id, elapsed, result)) = in_flight.next().await else {
                    break;
                };
                let name = graph.spec(id).name.clone();

                match result {
                    Ok(status) => {
                        report.tasks.push(TaskRecord {
                            name,
                            status,
                            elapsed,
                        });
                        for dependent in plan.dependents(id) {
                            if let Some(count) = remaining.get_mut(&dependent) {
                                *count -= 1;
                                if *count == 0 {
                                    ready.push_back(dependent);
                                }
                            }
                        }
                    }
                    Err(source) => {
                        tracing::error!("'{}' errored after {:?}: {}", name, elapsed, source);
                        if failure.is_none() {
                            failure = Some(PipelineError::TaskFailed { task: name, source });
                        }
                    }
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(report),
            }
        })
    }

    async fn run_task(&self, id: TaskId) -> TaskOutcome {
        let spec = self.graph().spec(id);
        let _running = match self.inner.running.get(&id) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        let started = Instant::now();
        tracing::info!("Starting '{}'...", spec.name);

        let result = match tasks::execute(self, &spec.action).await {
            Ok(()) => Ok(TaskStatus::Succeeded),
            Err(err) => match spec.action.error_policy() {
                ErrorPolicy::FailFast => Err(err),
                ErrorPolicy::ReportAndContinue => {
                    let ctx = self.context();
                    ctx.notifier()
                        .notify(&Notification::from_error(&ctx.config.notify, &err));
                    Ok(TaskStatus::Recovered)
                }
            },
        };

        let elapsed = started.elapsed();
        if result.is_ok() {
            tracing::info!("Finished '{}' after {:?}", spec.name, elapsed);
        }
        (id, elapsed, result)
    }
}
