//! Column (lane) assignment for drawing the dependency graph.
//!
//! # Algorithm
//! Rows are the topological order. Walking it top to bottom, each task
//! either continues the column of a dependency whose earliest dependent it
//! is, or takes a free column, or opens a new one. Columns work like commit
//! graph lanes: a column stays open while its last task still has unplaced
//! dependents (a reference count), and is freed for reuse once it has none.
//!
//! A candidate column is rejected if taking it would draw an edge from
//! another dependency straight through a task sitting in that column.

use serde::Serialize;
use std::collections::HashMap;

use super::Graph;
use crate::models::TaskId;

/// An edge segment that passes through a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiveEdge {
    pub dependency: TaskId,
    pub dependent: TaskId,
}

/// Result of [`Graph::layout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    columns: HashMap<TaskId, usize>,
    rows: HashMap<TaskId, usize>,
    column_count: usize,
    visible_paths: Vec<Vec<LiveEdge>>,
}

impl Layout {
    pub fn column(&self, id: TaskId) -> Option<usize> {
        self.columns.get(&id).copied()
    }

    pub fn row(&self, id: TaskId) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    /// Number of distinct columns ever allocated.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Edge segments to draw across `row`, from the dependency's row down
    /// to the dependent's row inclusive.
    pub fn visible_paths(&self, row: usize) -> &[LiveEdge] {
        self.visible_paths.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug)]
struct Column {
    last: TaskId,
    x: usize,
}

/// Whether column `x` is occupied between a dependency's row and the
/// current row, for any dependency other than `except`.
///
/// `col_at_row` holds the columns of the rows placed so far.
fn crosses_any(
    col_at_row: &[usize],
    rows: &HashMap<TaskId, usize>,
    parents: &[TaskId],
    except: Option<TaskId>,
    x: usize,
) -> bool {
    parents
        .iter()
        .filter(|&&p| Some(p) != except)
        .any(|p| col_at_row[rows[p] + 1..].contains(&x))
}

impl Graph {
    /// Assigns every task a column and a row.
    ///
    /// ```
    /// use u_forecast::graph::{CyclePolicy, Graph};
    /// use u_forecast::models::Task;
    ///
    /// let mut b = Graph::builder();
    /// let a = b.task(Task::new("A"));
    /// let bb = b.task(Task::new("B"));
    /// let c = b.task(Task::new("C"));
    /// b.depends_on(bb, a).depends_on(c, bb);
    /// let layout = b.build(CyclePolicy::Reject).unwrap().layout();
    /// assert_eq!(layout.column_count(), 1);
    /// assert_eq!(layout.column(c), Some(0));
    /// ```
    pub fn layout(&self) -> Layout {
        let rows: HashMap<TaskId, usize> =
            self.topo.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        let mut columns: HashMap<TaskId, usize> = HashMap::with_capacity(self.topo.len());
        let mut col_at_row: Vec<usize> = Vec::with_capacity(self.topo.len());
        let mut pending: HashMap<TaskId, usize> = self
            .topo
            .iter()
            .map(|&t| (t, self.dependents(t).len()))
            .collect();
        let mut active: Vec<Column> = Vec::new();
        let mut free: Vec<usize> = Vec::new();
        let mut column_count = 0;

        for &t in &self.topo {
            // Only dependencies already placed above; under a tolerated
            // cycle some may sit below.
            let parents: Vec<TaskId> = self
                .dependencies(t)
                .iter()
                .copied()
                .filter(|p| columns.contains_key(p))
                .collect();

            let inherited = parents.iter().copied().find_map(|p| {
                if self.first_dependent(p, &rows) != Some(t) {
                    return None;
                }
                let slot = active.iter().position(|c| c.last == p)?;
                let x = active[slot].x;
                (!crosses_any(&col_at_row, &rows, &parents, Some(p), x)).then_some(slot)
            });

            let x = match inherited {
                Some(slot) => {
                    active[slot].last = t;
                    active[slot].x
                }
                None => {
                    let parent_xs: Vec<usize> = parents.iter().map(|p| columns[p]).collect();
                    let reusable = free.iter().position(|&x| {
                        !parent_xs.contains(&x)
                            && !crosses_any(&col_at_row, &rows, &parents, None, x)
                    });
                    let x = match reusable {
                        Some(i) => free.remove(i),
                        None => {
                            column_count += 1;
                            column_count - 1
                        }
                    };
                    active.push(Column { last: t, x });
                    x
                }
            };
            columns.insert(t, x);
            col_at_row.push(x);

            for p in self.dependencies(t) {
                if let Some(count) = pending.get_mut(p) {
                    *count = count.saturating_sub(1);
                }
            }
            active.retain(|c| {
                let open = pending.get(&c.last).copied().unwrap_or(0) > 0;
                if !open {
                    free.push(c.x);
                }
                open
            });
            free.sort_unstable();
        }

        let mut visible_paths = vec![Vec::new(); self.topo.len()];
        for &(dependent, dependency) in &self.all_edges {
            let (Some(&from), Some(&to)) = (rows.get(&dependent), rows.get(&dependency)) else {
                continue;
            };
            for paths in visible_paths.iter_mut().take(from + 1).skip(to) {
                paths.push(LiveEdge {
                    dependency,
                    dependent,
                });
            }
        }

        Layout {
            columns,
            rows,
            column_count,
            visible_paths,
        }
    }

    /// The topologically earliest dependent of `id`.
    fn first_dependent(&self, id: TaskId, rows: &HashMap<TaskId, usize>) -> Option<TaskId> {
        self.dependents(id)
            .iter()
            .copied()
            .min_by_key(|d| rows.get(d).copied().unwrap_or(usize::MAX))
    }
}
