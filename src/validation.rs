//! Integrity checks for task graphs.
//!
//! Checks structural integrity of a [`Graph`] before forecasting. Detects:
//! - Adjacency lists that are not exact inverses
//! - Edges to tasks that no longer exist, and self-dependencies
//! - Topological orders that miss or repeat tasks
//! - Edges whose dependency sits below the dependent
//! - Circular dependencies (DAG validation)
//! - Unfinished tasks without an estimate, and finish dates before start dates
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::HashSet;

use crate::graph::{topological_sort, CyclePolicy, Graph};
use crate::models::TaskId;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `edges` and `inv_edges` disagree.
    InconsistentAdjacency,
    /// An edge references a task that doesn't exist.
    DanglingEdge,
    /// A task depends on itself.
    SelfDependency,
    /// The topological order misses or repeats a task.
    TopoMismatch,
    /// A dependency is ordered after its dependent.
    OrderViolation,
    /// The graph contains a cycle.
    CyclicDependency,
    /// An unfinished task has no estimate.
    MissingEstimate,
    /// A task finished before it started.
    InvalidDates,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a task graph.
///
/// Checks:
/// 1. Every edge appears in both adjacency directions
/// 2. All edge endpoints exist and differ
/// 3. `topo` lists every task exactly once
/// 4. Every dependency precedes its dependent in `topo`
/// 5. No circular dependencies
/// 6. Every unfinished task has an estimate
/// 7. No finish date precedes its start date
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_graph(graph: &Graph) -> ValidationResult {
    let mut errors = Vec::new();
    let ids: HashSet<TaskId> = graph.task_ids().collect();

    // Adjacency symmetry and endpoints
    for (&dependent, deps) in graph.raw_edges() {
        for &dependency in deps {
            if dependent == dependency {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SelfDependency,
                    format!("Task {dependent} depends on itself"),
                ));
            }
            if !ids.contains(&dependent) || !ids.contains(&dependency) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DanglingEdge,
                    format!("Edge {dependent}->{dependency} references an unknown task"),
                ));
            }
            if !graph.dependents(dependency).contains(&dependent) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentAdjacency,
                    format!("Edge {dependent}->{dependency} missing from inverse adjacency"),
                ));
            }
        }
    }
    for (&dependency, dependents) in graph.raw_inv_edges() {
        for &dependent in dependents {
            if !graph.dependencies(dependent).contains(&dependency) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentAdjacency,
                    format!("Inverse edge {dependency}<-{dependent} has no forward edge"),
                ));
            }
        }
    }

    // Topological order covers every task once
    let mut seen = HashSet::new();
    for &t in graph.topo() {
        if !seen.insert(t) {
            errors.push(ValidationError::new(
                ValidationErrorKind::TopoMismatch,
                format!("Task {t} appears more than once in the order"),
            ));
        }
    }
    for &t in ids.difference(&seen) {
        errors.push(ValidationError::new(
            ValidationErrorKind::TopoMismatch,
            format!("Task {t} is missing from the order"),
        ));
    }
    for &t in seen.difference(&ids) {
        errors.push(ValidationError::new(
            ValidationErrorKind::TopoMismatch,
            format!("Order lists {t}, which is not a task"),
        ));
    }

    // Order respects edges
    for &(dependent, dependency) in graph.all_edges() {
        if let (Some(r), Some(d)) = (graph.topo_index(dependent), graph.topo_index(dependency)) {
            if d > r {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OrderViolation,
                    format!("Dependency {dependency} (row {d}) is below dependent {dependent} (row {r})"),
                ));
            }
        }
    }

    // Cycles
    if let Err(e) = topological_sort(graph.topo(), graph.raw_edges(), CyclePolicy::Reject) {
        errors.push(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            e.to_string(),
        ));
    }

    // Task data
    for (id, task) in graph.tasks() {
        if !task.is_finished() && task.estimate.is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingEstimate,
                format!("Task {id} ('{}') has no estimate", task.name),
            ));
        }
        if let (Some(started), Some(finished)) = (task.started, task.finished) {
            if finished < started {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDates,
                    format!("Task {id} finished on {finished} before starting on {started}"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
