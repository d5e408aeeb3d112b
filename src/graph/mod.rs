//! Task dependency graph.
//!
//! Owns the tasks (addressed by [`TaskId`]), the dependency edges in both
//! directions, and a maintained topological order (`topo`).
//!
//! # Invariants
//! - `edges` (dependent → dependencies) and `inv_edges` (dependency →
//!   dependents) are exact inverses.
//! - For every edge, the dependency sits at or above the dependent in `topo`.
//!   [`Graph::add_edge`] refuses edges that would break this; use
//!   [`Graph::connect`] to re-sort instead.
//! - `topo` lists every task exactly once.
//!
//! Structural edits never touch forecast or layout outputs; callers
//! recompute those after a change (see [`Session`](crate::session::Session)).

mod builder;
mod layout;
mod topo;

pub use builder::GraphBuilder;
pub use layout::{Layout, LiveEdge};
pub use topo::{topological_sort, CyclePolicy};

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::errors::{ForecastError, Result};
use crate::models::{Task, TaskId, TaskStatus};

/// A DAG of tasks.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    tasks: BTreeMap<TaskId, Task>,
    /// dependent → dependencies
    edges: HashMap<TaskId, Vec<TaskId>>,
    /// dependency → dependents
    inv_edges: HashMap<TaskId, Vec<TaskId>>,
    topo: Vec<TaskId>,
    /// Materialized `(dependent, dependency)` list, in insertion order.
    all_edges: Vec<(TaskId, TaskId)>,
    next_id: u32,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a graph from tasks and dependencies.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Mutable access to a task's editable fields.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Tasks in topological order.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &Task)> + '_ {
        self.topo.iter().filter_map(|id| self.tasks.get(id).map(|t| (*id, t)))
    }

    /// The topological order: dependencies before dependents.
    pub fn topo(&self) -> &[TaskId] {
        &self.topo
    }

    /// Position of a task in [`topo`](Self::topo).
    pub fn topo_index(&self, id: TaskId) -> Option<usize> {
        self.topo.iter().position(|&t| t == id)
    }

    /// Tasks that `id` depends on.
    pub fn dependencies(&self, id: TaskId) -> &[TaskId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks that depend on `id`.
    pub fn dependents(&self, id: TaskId) -> &[TaskId] {
        self.inv_edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every edge as `(dependent, dependency)`.
    pub fn all_edges(&self) -> &[(TaskId, TaskId)] {
        &self.all_edges
    }

    /// Task after `id` in topological order, wrapping around.
    /// `None` yields the first task.
    pub fn next(&self, id: Option<TaskId>) -> Option<TaskId> {
        let Some(id) = id else {
            return self.topo.first().copied();
        };
        let idx = self.topo_index(id)?;
        Some(self.topo[(idx + 1) % self.topo.len()])
    }

    /// Task before `id` in topological order, wrapping around.
    /// `None` yields the last task.
    pub fn prev(&self, id: Option<TaskId>) -> Option<TaskId> {
        let Some(id) = id else {
            return self.topo.last().copied();
        };
        let idx = self.topo_index(id)?;
        let prev = if idx == 0 { self.topo.len() - 1 } else { idx - 1 };
        Some(self.topo[prev])
    }

    /// Status of a task from its actual dates and its dependencies'.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        let task = self.tasks.get(&id)?;
        let status = if task.is_finished() {
            TaskStatus::Finished
        } else if task.is_started() {
            TaskStatus::Started
        } else if self
            .dependencies(id)
            .iter()
            .all(|d| self.tasks.get(d).is_some_and(Task::is_finished))
        {
            TaskStatus::Ready
        } else {
            TaskStatus::Blocked
        };
        Some(status)
    }

    /// Whether a task waits on an unfinished dependency.
    pub fn blocked(&self, id: TaskId) -> bool {
        self.status(id) == Some(TaskStatus::Blocked)
    }

    // ---------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------

    fn require(&self, id: TaskId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ForecastError::UnknownTask(id))
        }
    }

    /// Makes `dependent` depend on `dependency`.
    ///
    /// Returns `Ok(false)` if the edge already existed. Fails without
    /// changing anything if either task is unknown, if the edge is a
    /// self-loop, or if `dependency` sits below `dependent` in `topo`.
    pub fn add_edge(&mut self, dependent: TaskId, dependency: TaskId) -> Result<bool> {
        self.require(dependent)?;
        self.require(dependency)?;
        if dependent == dependency {
            return Err(ForecastError::SelfDependency(dependent));
        }
        let dependent_index = self.topo_index(dependent).unwrap_or(0);
        let dependency_index = self.topo_index(dependency).unwrap_or(0);
        if dependency_index > dependent_index {
            warn!(
                %dependent,
                %dependency,
                dependent_index,
                dependency_index,
                "rejected edge: dependency is ordered after its dependent"
            );
            return Err(ForecastError::OrderViolation {
                dependent,
                dependency,
                dependent_index,
                dependency_index,
            });
        }
        Ok(self.insert_edge(dependent, dependency))
    }

    /// Adds an edge without order checks. Returns whether it was new.
    fn insert_edge(&mut self, dependent: TaskId, dependency: TaskId) -> bool {
        let deps = self.edges.entry(dependent).or_default();
        if deps.contains(&dependency) {
            return false;
        }
        deps.push(dependency);
        let inv = self.inv_edges.entry(dependency).or_default();
        if !inv.contains(&dependent) {
            inv.push(dependent);
        }
        self.all_edges.push((dependent, dependency));
        true
    }

    /// Like [`add_edge`](Self::add_edge), but re-sorts `topo` when the edge
    /// goes against the current order. The edge is rolled back if the
    /// re-sort fails, e.g. because it would close a cycle.
    pub fn connect(
        &mut self,
        dependent: TaskId,
        dependency: TaskId,
        policy: CyclePolicy,
    ) -> Result<bool> {
        match self.add_edge(dependent, dependency) {
            Err(ForecastError::OrderViolation { .. }) => {
                self.insert_edge(dependent, dependency);
                if let Err(e) = self.resort(policy) {
                    self.remove_edge(dependent, dependency);
                    return Err(e);
                }
                debug!(%dependent, %dependency, "re-sorted to admit edge");
                Ok(true)
            }
            other => other,
        }
    }

    /// Removes the edge `dependent → dependency`. Returns whether it existed.
    pub fn remove_edge(&mut self, dependent: TaskId, dependency: TaskId) -> bool {
        let mut removed = false;
        if let Some(deps) = self.edges.get_mut(&dependent) {
            if let Some(i) = deps.iter().position(|&d| d == dependency) {
                deps.remove(i);
                removed = true;
            }
        }
        if let Some(inv) = self.inv_edges.get_mut(&dependency) {
            if let Some(i) = inv.iter().position(|&d| d == dependent) {
                inv.remove(i);
            }
        }
        if let Some(i) = self
            .all_edges
            .iter()
            .position(|&e| e == (dependent, dependency))
        {
            self.all_edges.remove(i);
        }
        removed
    }

    // ---------------------------------------------------------------
    // Vertices
    // ---------------------------------------------------------------

    fn allocate(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(id, task);
        self.edges.insert(id, Vec::new());
        self.inv_edges.insert(id, Vec::new());
        id
    }

    fn anchor_index(&self, anchor: Option<TaskId>) -> Result<Option<usize>> {
        match anchor {
            None => Ok(None),
            Some(a) => self
                .topo_index(a)
                .map(Some)
                .ok_or(ForecastError::UnknownTask(a)),
        }
    }

    /// Adds an edge-less task directly above `anchor` (or at the top).
    pub fn insert_before(&mut self, task: Task, anchor: Option<TaskId>) -> Result<TaskId> {
        let idx = self.anchor_index(anchor)?.unwrap_or(0);
        let id = self.allocate(task);
        self.topo.insert(idx, id);
        Ok(id)
    }

    /// Adds an edge-less task directly below `anchor` (or at the top).
    pub fn insert_after(&mut self, task: Task, anchor: Option<TaskId>) -> Result<TaskId> {
        let idx = self.anchor_index(anchor)?.map_or(0, |i| i + 1);
        let id = self.allocate(task);
        self.topo.insert(idx, id);
        Ok(id)
    }

    /// Inserts a task that `target` will depend on.
    ///
    /// Unless `branch` is set, `target`'s current dependencies move to the
    /// new task, splicing it into the existing chain.
    pub fn insert_upstream(&mut self, task: Task, target: TaskId, branch: bool) -> Result<TaskId> {
        let id = self.insert_before(task, Some(target))?;
        if !branch {
            for dep in self.dependencies(target).to_vec() {
                self.remove_edge(target, dep);
                self.insert_edge(id, dep);
            }
        }
        self.insert_edge(target, id);
        Ok(id)
    }

    /// Inserts a task that depends on `target`.
    ///
    /// Unless `branch` is set, `target`'s current dependents are re-pointed
    /// at the new task.
    pub fn insert_downstream(&mut self, task: Task, target: TaskId, branch: bool) -> Result<TaskId> {
        let id = self.insert_after(task, Some(target))?;
        if !branch {
            for dependent in self.dependents(target).to_vec() {
                self.remove_edge(dependent, target);
                self.insert_edge(dependent, id);
            }
        }
        self.insert_edge(id, target);
        Ok(id)
    }

    /// Deletes a task and its edges, returning the task.
    ///
    /// With `heal_edges`, every former dependent is connected directly to
    /// every former dependency, preserving reachability.
    pub fn remove_node(&mut self, id: TaskId, heal_edges: bool) -> Result<Task> {
        let task = self.tasks.remove(&id).ok_or(ForecastError::UnknownTask(id))?;
        self.topo.retain(|&t| t != id);
        let dependents = self.inv_edges.remove(&id).unwrap_or_default();
        let dependencies = self.edges.remove(&id).unwrap_or_default();

        for &r in &dependents {
            if let Some(deps) = self.edges.get_mut(&r) {
                deps.retain(|&d| d != id);
            }
        }
        for &d in &dependencies {
            if let Some(inv) = self.inv_edges.get_mut(&d) {
                inv.retain(|&r| r != id);
            }
        }
        self.all_edges.retain(|&(a, b)| a != id && b != id);

        if heal_edges {
            // The removed task sat between both groups, so `topo` already
            // orders every dependency above every dependent.
            // A task on a tolerated 2-cycle is both; skip the self-loop.
            for &r in &dependents {
                for &d in dependencies.iter().filter(|&&d| d != r) {
                    self.insert_edge(r, d);
                }
            }
        }
        debug!(%id, heal_edges, healed = dependents.len() * dependencies.len(), "removed task");
        Ok(task)
    }

    /// Moves a task one row up, if its dependencies stay above it.
    pub fn shift_up(&mut self, id: TaskId) -> Result<bool> {
        let idx = self.topo_index(id).ok_or(ForecastError::UnknownTask(id))?;
        let latest_dep = self
            .dependencies(id)
            .iter()
            .filter_map(|&d| self.topo_index(d))
            .max();
        let movable = idx > 0 && latest_dep.map_or(true, |l| idx - 1 > l);
        if movable {
            self.topo.swap(idx - 1, idx);
        }
        Ok(movable)
    }

    /// Moves a task one row down, if its dependents stay below it.
    pub fn shift_down(&mut self, id: TaskId) -> Result<bool> {
        let idx = self.topo_index(id).ok_or(ForecastError::UnknownTask(id))?;
        let first_dependent = self
            .dependents(id)
            .iter()
            .filter_map(|&d| self.topo_index(d))
            .min()
            .unwrap_or(self.topo.len());
        let movable = idx + 1 < first_dependent;
        if movable {
            self.topo.swap(idx, idx + 1);
        }
        Ok(movable)
    }

    // ---------------------------------------------------------------
    // Whole-graph operations
    // ---------------------------------------------------------------

    /// Recomputes `topo` from the edges, keeping the current order where
    /// the edges allow, and re-sorts both adjacency lists by it.
    pub fn resort(&mut self, policy: CyclePolicy) -> Result<()> {
        let topo = topological_sort(&self.topo, &self.edges, policy)?;
        self.topo = topo;
        self.sort_adjacency();
        Ok(())
    }

    fn sort_adjacency(&mut self) {
        let order: HashMap<TaskId, usize> =
            self.topo.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        let key = |t: &TaskId| order.get(t).copied().unwrap_or(usize::MAX);
        for list in self.edges.values_mut().chain(self.inv_edges.values_mut()) {
            list.sort_by_key(key);
        }
    }

    /// The induced subgraph on `subset`, keeping the relative order.
    pub fn sub_graph(&self, subset: &HashSet<TaskId>) -> Graph {
        let keep = |t: &TaskId| subset.contains(t);
        let project = |map: &HashMap<TaskId, Vec<TaskId>>| -> HashMap<TaskId, Vec<TaskId>> {
            map.iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, vs)| (*k, vs.iter().copied().filter(keep).collect()))
                .collect()
        };
        Graph {
            tasks: self
                .tasks
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, t)| (*k, t.clone()))
                .collect(),
            edges: project(&self.edges),
            inv_edges: project(&self.inv_edges),
            topo: self.topo.iter().copied().filter(keep).collect(),
            all_edges: self
                .all_edges
                .iter()
                .copied()
                .filter(|(a, b)| keep(a) && keep(b))
                .collect(),
            next_id: self.next_id,
        }
    }

    /// Removes `subset` (without healing) and returns it as its own graph.
    ///
    /// Ids in `subset` that are not in the graph are ignored.
    pub fn remove_sub_component(&mut self, subset: &HashSet<TaskId>) -> Result<Graph> {
        let extracted = self.sub_graph(subset);
        for id in extracted.task_ids() {
            self.remove_node(id, false)?;
        }
        Ok(extracted)
    }

    pub(crate) fn from_parts(
        tasks: BTreeMap<TaskId, Task>,
        edges: HashMap<TaskId, Vec<TaskId>>,
        topo: Vec<TaskId>,
        next_id: u32,
    ) -> Self {
        let mut inv_edges: HashMap<TaskId, Vec<TaskId>> =
            tasks.keys().map(|&t| (t, Vec::new())).collect();
        let mut all_edges = Vec::new();
        for &dependent in &topo {
            for &dependency in edges.get(&dependent).map(Vec::as_slice).unwrap_or(&[]) {
                inv_edges.entry(dependency).or_default().push(dependent);
                all_edges.push((dependent, dependency));
            }
        }
        let mut edges = edges;
        for &t in tasks.keys() {
            edges.entry(t).or_default();
        }
        let mut graph = Self {
            tasks,
            edges,
            inv_edges,
            topo,
            all_edges,
            next_id,
        };
        graph.sort_adjacency();
        graph
    }

    pub(crate) fn raw_edges(&self) -> &HashMap<TaskId, Vec<TaskId>> {
        &self.edges
    }

    pub(crate) fn raw_inv_edges(&self) -> &HashMap<TaskId, Vec<TaskId>> {
        &self.inv_edges
    }

    #[cfg(test)]
    pub(crate) fn topo_mut(&mut self) -> &mut Vec<TaskId> {
        &mut self.topo
    }

    pub(crate) fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }
}
