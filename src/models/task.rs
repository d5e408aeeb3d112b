//! Task model.
//!
//! A task is a unit of project work. It is either ordinary work with a
//! duration [`Estimate`], or a zero-length milestone. Actual start/finish
//! dates, once recorded, replace the estimate: a fixed date is a known
//! quantity and is never simulated.
//!
//! This record only holds user-editable state. Derived dates live in a
//! [`Forecast`](crate::scheduler::Forecast) and layout outputs in a
//! [`Layout`](crate::graph::Layout), both produced wholesale per pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Estimate;

/// Stable handle of a task inside a [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Ordinary work.
    #[default]
    Task,
    /// A checkpoint shown on the milestone timeline.
    Milestone,
}

/// Progress of a task relative to its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// At least one dependency is unfinished.
    Blocked,
    /// All dependencies finished, not started yet.
    Ready,
    /// Started, not finished.
    Started,
    /// Finished.
    Finished,
}

/// A task in the project graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Human-readable name.
    pub name: String,
    /// Ordinary task or milestone.
    pub kind: TaskKind,
    /// Actual start date. `Some` = fixed, not modeled.
    pub started: Option<NaiveDate>,
    /// Actual finish date. `Some` = fixed, not modeled.
    pub finished: Option<NaiveDate>,
    /// Duration estimate. Required for unfinished tasks to be forecast.
    pub estimate: Option<Estimate>,
}

impl Task {
    /// Creates an ordinary task with no estimate.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Task,
            started: None,
            finished: None,
            estimate: None,
        }
    }

    /// Creates a milestone.
    pub fn milestone(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(TaskKind::Milestone)
    }

    /// Sets the kind.
    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the estimate.
    pub fn with_estimate(mut self, estimate: Estimate) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// Sets the actual start date.
    pub fn with_started(mut self, date: NaiveDate) -> Self {
        self.started = Some(date);
        self
    }

    /// Sets the actual finish date.
    pub fn with_finished(mut self, date: NaiveDate) -> Self {
        self.finished = Some(date);
        self
    }

    #[inline]
    pub fn is_milestone(&self) -> bool {
        self.kind == TaskKind::Milestone
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }

    /// Advances the actual dates: unset → started → finished → unset.
    pub fn toggle_status(&mut self, date: NaiveDate) {
        if self.finished.is_some() {
            self.started = None;
            self.finished = None;
        } else if self.started.is_some() {
            self.finished = Some(date);
        } else {
            self.started = Some(date);
        }
    }
}
