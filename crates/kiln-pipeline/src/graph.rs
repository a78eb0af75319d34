use crate::config::{Config, VendorEntry};
use crate::error::PipelineError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Task identifier (graph node index)
pub type TaskId = NodeIndex;

/// What happens when a task's action fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop scheduling and fail the run
    FailFast,

    /// Notify, then treat the task as complete
    ReportAndContinue,
}

/// The work a task performs once its prerequisites are done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Composite task, nothing of its own
    None,
    Lint,
    /// Copy a vendor file into the source tree when newer
    CopyNewer(VendorEntry),
    /// Publish the vendor copies to the components directory
    CopyComponents,
    Concat,
    Sass,
    Watch,
    Serve,
}

impl Action {
    pub fn error_policy(&self) -> ErrorPolicy {
        match self {
            Action::Sass => ErrorPolicy::ReportAndContinue,
            _ => ErrorPolicy::FailFast,
        }
    }
}

/// Declarative task definition
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,

    /// Prerequisites, in declaration order
    pub deps: Vec<String>,

    /// Run prerequisites one after another instead of concurrently
    pub series: bool,

    pub action: Action,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, deps: &[&str], action: Action) -> Self {
        Self {
            name: name.into(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            series: false,
            action,
        }
    }

    pub fn series(mut self) -> Self {
        self.series = true;
        self
    }
}

/// Task graph; an edge `a -> b` means `b` needs `a` first
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraph<TaskSpec, ()>,
    name_to_id: HashMap<String, TaskId>,
}

/// Execution plan for one target: its task closure and what each task waits on
#[derive(Debug, Clone)]
pub struct Plan {
    /// Topological order
    pub order: Vec<TaskId>,
    pub waits_on: HashMap<TaskId, Vec<TaskId>>,
}

impl Plan {
    /// Tasks waiting on `id`
    pub fn dependents(&self, id: TaskId) -> Vec<TaskId> {
        self.order
            .iter()
            .copied()
            .filter(|t| self.waits_on.get(t).is_some_and(|w| w.contains(&id)))
            .collect()
    }
}

impl TaskGraph {
    /// Build and validate a graph from task definitions
    pub fn from_specs(specs: Vec<TaskSpec>) -> Result<Self, PipelineError> {
        let mut graph = DiGraph::new();
        let mut name_to_id = HashMap::new();

        for spec in specs {
            if name_to_id.contains_key(&spec.name) {
                return Err(PipelineError::DuplicateTask(spec.name));
            }
            let name = spec.name.clone();
            let id = graph.add_node(spec);
            name_to_id.insert(name, id);
        }

        let mut edges = Vec::new();
        for id in graph.node_indices() {
            let spec = &graph[id];
            for dep in &spec.deps {
                let dep_id = name_to_id.get(dep).copied().ok_or_else(|| {
                    PipelineError::UnknownDependency {
                        task: spec.name.clone(),
                        dependency: dep.clone(),
                    }
                })?;
                edges.push((dep_id, id));
            }
        }
        for (from, to) in edges {
            graph.update_edge(from, to, ());
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(PipelineError::Cycle(graph[cycle.node_id()].name.clone()));
        }

        let task_graph = Self { graph, name_to_id };

        // series ordering could still close a loop inside one plan
        for id in task_graph.graph.node_indices() {
            if task_graph.graph[id].series {
                task_graph.plan_for(id)?;
            }
        }

        Ok(task_graph)
    }

    /// The standard kiln task set wired from configuration
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let vendor_names: Vec<&str> = config.vendor.iter().map(|v| v.name.as_str()).collect();

        let mut specs = vec![TaskSpec::new("eslint", &[], Action::Lint)];
        for entry in &config.vendor {
            specs.push(TaskSpec::new(
                entry.name.clone(),
                &[],
                Action::CopyNewer(entry.clone()),
            ));
        }

        let mut concat_deps = vendor_names.clone();
        concat_deps.push("eslint");

        specs.extend([
            TaskSpec::new("copy-js-components", &vendor_names, Action::CopyComponents),
            TaskSpec::new("concat", &concat_deps, Action::Concat),
            TaskSpec::new("sass", &[], Action::Sass),
            TaskSpec::new("watch", &[], Action::Watch),
            TaskSpec::new("browsersync", &[], Action::Serve),
            TaskSpec::new("build", &["sass", "copy-js-components", "concat"], Action::None),
            TaskSpec::new("default", &["build", "browsersync", "watch"], Action::None).series(),
        ]);

        Self::from_specs(specs)
    }

    pub fn get(&self, name: &str) -> Option<TaskId> {
        self.name_to_id.get(name).copied()
    }

    pub fn spec(&self, id: TaskId) -> &TaskSpec {
        &self.graph[id]
    }

    /// All tasks in definition order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.graph.node_weights()
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct prerequisites of a task
    pub fn dependencies(&self, id: TaskId) -> Vec<TaskId> {
        self.graph.neighbors_directed(id, Direction::Incoming).collect()
    }

    /// The target and everything it transitively needs
    pub fn closure(&self, target: TaskId) -> HashSet<TaskId> {
        let mut seen = HashSet::new();
        let mut stack = vec![target];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.graph.neighbors_directed(id, Direction::Incoming));
            }
        }
        seen
    }

    /// Plan a run of `target`
    pub fn plan(&self, target: &str) -> Result<Plan, PipelineError> {
        let id = self
            .get(target)
            .ok_or_else(|| PipelineError::UnknownTask(target.to_string()))?;
        self.plan_for(id)
    }

    fn plan_for(&self, target: TaskId) -> Result<Plan, PipelineError> {
        let closure = self.closure(target);

        let mut waits_on: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for &id in &closure {
            waits_on.insert(id, self.dependencies(id));
        }

        // series composites: each prerequisite waits for the one before it
        for &id in &closure {
            let spec = &self.graph[id];
            if !spec.series {
                continue;
            }
            let ids: Vec<TaskId> = spec.deps.iter().filter_map(|d| self.get(d)).collect();
            for pair in ids.windows(2) {
                let entry = waits_on.entry(pair[1]).or_default();
                if !entry.contains(&pair[0]) {
                    entry.push(pair[0]);
                }
            }
        }

        let mut plan_graph: DiGraph<TaskId, ()> = DiGraph::new();
        let mut local = HashMap::new();
        for &id in &closure {
            local.insert(id, plan_graph.add_node(id));
        }
        for (id, waits) in &waits_on {
            for w in waits {
                if let (Some(&from), Some(&to)) = (local.get(w), local.get(id)) {
                    plan_graph.update_edge(from, to, ());
                }
            }
        }

        let order = toposort(&plan_graph, None)
            .map_err(|cycle| PipelineError::Cycle(self.graph[plan_graph[cycle.node_id()]].name.clone()))?
            .into_iter()
            .map(|n| plan_graph[n])
            .collect();

        Ok(Plan { order, waits_on })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &TaskGraph, ids: &[TaskId]) -> Vec<String> {
        ids.iter().map(|&id| graph.spec(id).name.clone()).collect()
    }

    #[test]
    fn test_default_graph() {
        let graph = TaskGraph::from_config(&Config::default()).unwrap();
        assert_eq!(graph.task_count(), 10);

        let concat = graph.get("concat").unwrap();
        let mut deps = names(&graph, &graph.dependencies(concat));
        deps.sort();
        assert_eq!(deps, vec!["copy-react", "copy-react-dom", "eslint"]);

        assert_eq!(graph.spec(graph.get("sass").unwrap()).action.error_policy(), ErrorPolicy::ReportAndContinue);
        assert_eq!(graph.spec(concat).action.error_policy(), ErrorPolicy::FailFast);
    }

    #[test]
    fn test_plan_orders_prerequisites_first() {
        let graph = TaskGraph::from_config(&Config::default()).unwrap();
        let plan = graph.plan("concat").unwrap();
        let order = names(&graph, &plan.order);

        assert_eq!(order.len(), 4);
        assert_eq!(order.last().map(String::as_str), Some("concat"));
        assert!(!order.contains(&"sass".to_string()));
    }

    #[test]
    fn test_series_plan() {
        let graph = TaskGraph::from_config(&Config::default()).unwrap();
        let plan = graph.plan("default").unwrap();
        let order = names(&graph, &plan.order);
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();

        assert!(pos("build") < pos("browsersync"));
        assert!(pos("browsersync") < pos("watch"));
        assert!(pos("concat") < pos("build"));

        let browsersync = graph.get("browsersync").unwrap();
        let build = graph.get("build").unwrap();
        assert!(plan.waits_on[&browsersync].contains(&build));
        assert!(plan.dependents(build).contains(&browsersync));

        // ordering only applies inside "default"
        let alone = graph.plan("browsersync").unwrap();
        assert_eq!(alone.order, vec![browsersync]);
    }

    #[test]
    fn test_unknown_dependency() {
        let err = TaskGraph::from_specs(vec![TaskSpec::new("a", &["missing"], Action::None)]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownDependency { ref task, ref dependency } if task == "a" && dependency == "missing"
        ));
    }

    #[test]
    fn test_duplicate_task() {
        let err = TaskGraph::from_specs(vec![
            TaskSpec::new("a", &[], Action::None),
            TaskSpec::new("a", &[], Action::Lint),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateTask(name) if name == "a"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = TaskGraph::from_specs(vec![
            TaskSpec::new("a", &["b"], Action::None),
            TaskSpec::new("b", &["a"], Action::None),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Cycle(_)));
    }

    #[test]
    fn test_series_cycle_rejected() {
        // "b" needs "a", but the series puts "b" first
        let err = TaskGraph::from_specs(vec![
            TaskSpec::new("a", &[], Action::None),
            TaskSpec::new("b", &["a"], Action::None),
            TaskSpec::new("all", &["b", "a"], Action::None).series(),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Cycle(_)));
    }

    #[test]
    fn test_unknown_target() {
        let graph = TaskGraph::from_config(&Config::default()).unwrap();
        assert!(matches!(graph.plan("deploy"), Err(PipelineError::UnknownTask(_))));
    }
}
