//! Crate-wide error type.
//!
//! Structural failures (unknown tasks, edges that would break the
//! topological order, cycles) and input failures (malformed estimates,
//! bad configuration) are reported through [`ForecastError`].
//!
//! Simulation failures are *not* errors here: a task without an estimate
//! yields [`SimValue::Error`](crate::sim::SimValue::Error), which flows
//! through the propagation and ends up as a displayable message.

use thiserror::Error;

use crate::models::TaskId;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Task not found: {0}")]
    UnknownTask(TaskId),

    #[error(
        "Edge {dependent}->{dependency} breaks topological order \
         (dependent at {dependent_index}, dependency at {dependency_index})"
    )]
    OrderViolation {
        dependent: TaskId,
        dependency: TaskId,
        dependent_index: usize,
        dependency_index: usize,
    },

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("Not a DAG: {0}")]
    Cycle(String),

    #[error("Invalid estimate: {0:?}")]
    InvalidEstimate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = ForecastError::OrderViolation {
            dependent: TaskId(1),
            dependency: TaskId(2),
            dependent_index: 0,
            dependency_index: 1,
        };
        assert_eq!(
            e.to_string(),
            "Edge #1->#2 breaks topological order (dependent at 0, dependency at 1)"
        );
        assert_eq!(
            ForecastError::InvalidEstimate("3-x".into()).to_string(),
            "Invalid estimate: \"3-x\""
        );
        assert_eq!(ForecastError::Cycle("#1->#2->#1".into()).to_string(), "Not a DAG: #1->#2->#1");
    }
}
