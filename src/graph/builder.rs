//! Bulk construction of a [`Graph`].

use std::collections::{BTreeMap, HashMap};

use super::{topological_sort, CyclePolicy, Graph};
use crate::errors::{ForecastError, Result};
use crate::models::{Task, TaskId};

/// Collects tasks and dependencies in any order, then sorts once.
///
/// # Example
/// ```
/// use u_forecast::graph::{CyclePolicy, Graph};
/// use u_forecast::models::Task;
///
/// let mut b = Graph::builder();
/// let design = b.task(Task::new("Design"));
/// let build = b.task(Task::new("Build"));
/// b.depends_on(build, design);
/// let graph = b.build(CyclePolicy::Reject).unwrap();
/// assert_eq!(graph.dependencies(build), &[design]);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    tasks: BTreeMap<TaskId, Task>,
    order: Vec<TaskId>,
    edges: HashMap<TaskId, Vec<TaskId>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task and returns its id.
    pub fn task(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.order.len() as u32);
        self.tasks.insert(id, task);
        self.order.push(id);
        id
    }

    /// Records that `dependent` depends on `dependency`.
    pub fn depends_on(&mut self, dependent: TaskId, dependency: TaskId) -> &mut Self {
        let deps = self.edges.entry(dependent).or_default();
        if !deps.contains(&dependency) {
            deps.push(dependency);
        }
        self
    }

    /// Validates the edges and sorts the tasks topologically.
    ///
    /// Insertion order is kept wherever the edges allow.
    pub fn build(self, policy: CyclePolicy) -> Result<Graph> {
        for (&dependent, deps) in &self.edges {
            if !self.tasks.contains_key(&dependent) {
                return Err(ForecastError::UnknownTask(dependent));
            }
            for &dependency in deps {
                if !self.tasks.contains_key(&dependency) {
                    return Err(ForecastError::UnknownTask(dependency));
                }
                if dependency == dependent {
                    return Err(ForecastError::SelfDependency(dependent));
                }
            }
        }
        let topo = topological_sort(&self.order, &self.edges, policy)?;
        let next_id = self.order.len() as u32;
        Ok(Graph::from_parts(self.tasks, self.edges, topo, next_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sorts_dependencies_first() {
        let mut b = GraphBuilder::new();
        let late = b.task(Task::new("late"));
        let early = b.task(Task::new("early"));
        b.depends_on(late, early);
        let g = b.build(CyclePolicy::Reject).unwrap();
        assert_eq!(g.topo(), &[early, late]);
        assert_eq!(g.dependents(early), &[late]);
        assert_eq!(g.all_edges(), &[(late, early)]);
    }

    #[test]
    fn test_build_rejects_cycle() {
        let mut b = GraphBuilder::new();
        let x = b.task(Task::new("x"));
        let y = b.task(Task::new("y"));
        b.depends_on(x, y).depends_on(y, x);
        assert!(matches!(
            b.build(CyclePolicy::Reject),
            Err(ForecastError::Cycle(_))
        ));
    }

    #[test]
    fn test_build_rejects_unknown_and_self() {
        let mut b = GraphBuilder::new();
        let x = b.task(Task::new("x"));
        b.depends_on(x, TaskId(5));
        assert!(matches!(
            b.build(CyclePolicy::Reject),
            Err(ForecastError::UnknownTask(TaskId(5)))
        ));

        let mut b = GraphBuilder::new();
        let x = b.task(Task::new("x"));
        b.depends_on(x, x);
        assert!(matches!(
            b.build(CyclePolicy::Tolerate),
            Err(ForecastError::SelfDependency(_))
        ));
    }

    #[test]
    fn test_built_graph_continues_ids() {
        let mut b = GraphBuilder::new();
        b.task(Task::new("a"));
        b.task(Task::new("b"));
        let mut g = b.build(CyclePolicy::Reject).unwrap();
        let c = g.insert_after(Task::new("c"), None).unwrap();
        assert_eq!(c, TaskId(2));
    }
}
