//! Topological ordering.
//!
//! # Algorithm
//! Depth-first search with three marks (unvisited / in progress / done),
//! following dependency edges. A vertex is emitted after all of its
//! dependencies, so the resulting order lists every dependency before its
//! dependents. An edge into an in-progress vertex is a back edge: the graph
//! has a cycle.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::errors::{ForecastError, Result};
use crate::models::TaskId;

/// What to do when a cycle is found while sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Fail with [`ForecastError::Cycle`].
    #[default]
    Reject,
    /// Log the cycle and keep going. The order is then best-effort and the
    /// edge invariant does not hold for the edges on the cycle.
    Tolerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Dfs<'a> {
    edges: &'a HashMap<TaskId, Vec<TaskId>>,
    marks: HashMap<TaskId, Mark>,
    stack: Vec<TaskId>,
    order: Vec<TaskId>,
    policy: CyclePolicy,
}

impl Dfs<'_> {
    /// Visits `root` and everything it depends on. Iterative, so deep
    /// dependency chains cost heap rather than call stack.
    fn visit(&mut self, root: TaskId) -> Result<()> {
        if self.marks.get(&root) != Some(&Mark::Unvisited) {
            return Ok(());
        }
        self.enter(root);
        let edges = self.edges;

        // (vertex, index of the next dependency edge to follow)
        let mut frames: Vec<(TaskId, usize)> = vec![(root, 0)];
        while let Some(frame) = frames.last_mut() {
            let (v, next) = *frame;
            let deps = edges.get(&v).map(Vec::as_slice).unwrap_or(&[]);
            let Some(&u) = deps.get(next) else {
                frames.pop();
                self.stack.pop();
                self.marks.insert(v, Mark::Done);
                self.order.push(v);
                continue;
            };
            frame.1 += 1;
            match self.marks.get(&u) {
                Some(Mark::Unvisited) => {
                    self.enter(u);
                    frames.push((u, 0));
                }
                Some(Mark::InProgress) => {
                    let cycle = self.describe_cycle(u);
                    match self.policy {
                        CyclePolicy::Reject => return Err(ForecastError::Cycle(cycle)),
                        CyclePolicy::Tolerate => warn!(%cycle, "not a DAG, continuing"),
                    }
                }
                // Done, or an endpoint outside the vertex set.
                Some(Mark::Done) | None => {}
            }
        }
        Ok(())
    }

    fn enter(&mut self, v: TaskId) {
        self.marks.insert(v, Mark::InProgress);
        self.stack.push(v);
    }

    /// Renders the stack segment from `start` back to itself, e.g. `#1->#2->#1`.
    fn describe_cycle(&self, start: TaskId) -> String {
        let pos = self.stack.iter().position(|&t| t == start).unwrap_or(0);
        self.stack[pos..]
            .iter()
            .chain(std::iter::once(&start))
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("->")
    }
}

/// Orders `vertices` so that every dependency precedes its dependents.
///
/// `edges` maps a dependent to its dependencies. Vertices are visited in the
/// given order, which makes the result stable for already-sorted input.
pub fn topological_sort(
    vertices: &[TaskId],
    edges: &HashMap<TaskId, Vec<TaskId>>,
    policy: CyclePolicy,
) -> Result<Vec<TaskId>> {
    let mut dfs = Dfs {
        edges,
        marks: vertices.iter().map(|&v| (v, Mark::Unvisited)).collect(),
        stack: Vec::new(),
        order: Vec::with_capacity(vertices.len()),
        policy,
    };
    for &v in vertices {
        dfs.visit(v)?;
    }
    Ok(dfs.order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<TaskId> {
        (0..n).map(TaskId).collect()
    }

    fn edges(pairs: &[(u32, u32)]) -> HashMap<TaskId, Vec<TaskId>> {
        let mut e: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for &(dependent, dependency) in pairs {
            e.entry(TaskId(dependent)).or_default().push(TaskId(dependency));
        }
        e
    }

    fn index(order: &[TaskId], t: u32) -> usize {
        order.iter().position(|&v| v == TaskId(t)).unwrap()
    }

    #[test]
    fn test_dependencies_first() {
        // 0 depends on 2, 2 depends on 1, 3 depends on 0 and 1
        let e = edges(&[(0, 2), (2, 1), (3, 0), (3, 1)]);
        let order = topological_sort(&ids(4), &e, CyclePolicy::Reject).unwrap();
        assert_eq!(order.len(), 4);
        for (dependent, deps) in &e {
            for d in deps {
                assert!(index(&order, d.0) < index(&order, dependent.0));
            }
        }
    }

    #[test]
    fn test_sorted_input_is_stable() {
        let e = edges(&[(1, 0), (2, 1)]);
        let order = topological_sort(&ids(3), &e, CyclePolicy::Reject).unwrap();
        assert_eq!(order, ids(3));
    }

    #[test]
    fn test_cycle_rejected() {
        let e = edges(&[(0, 1), (1, 2), (2, 0)]);
        let err = topological_sort(&ids(3), &e, CyclePolicy::Reject).unwrap_err();
        match err {
            ForecastError::Cycle(path) => assert_eq!(path, "#0->#1->#2->#0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_tolerated() {
        let e = edges(&[(0, 1), (1, 0), (2, 1)]);
        let order = topological_sort(&ids(3), &e, CyclePolicy::Tolerate).unwrap();
        assert_eq!(order.len(), 3);
        assert!(index(&order, 1) < index(&order, 2));
    }

    #[test]
    fn test_deep_chain_reverse_input() {
        // i depends on i + 1, so the whole chain hangs off vertex 0.
        let n = 10_000;
        let pairs: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let e = edges(&pairs);
        let order = topological_sort(&ids(n), &e, CyclePolicy::Reject).unwrap();
        let expected: Vec<TaskId> = (0..n).rev().map(TaskId).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_deep_cycle_path() {
        let n = 5_000;
        let mut pairs: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        pairs.push((n - 1, 0));
        let err = topological_sort(&ids(n), &edges(&pairs), CyclePolicy::Reject).unwrap_err();
        match err {
            ForecastError::Cycle(path) => {
                assert!(path.starts_with("#0->#1->"));
                assert!(path.ends_with(&format!("#{}->#0", n - 1)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dangling_endpoint_ignored() {
        let e = edges(&[(0, 9)]);
        let order = topological_sort(&ids(1), &e, CyclePolicy::Reject).unwrap();
        assert_eq!(order, ids(1));
    }
}
