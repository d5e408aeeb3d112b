//! Date propagation and forecast queries.
//!
//! Turns a task graph with uncertain estimates into per-task start and
//! finish distributions, expressed as calendar-date percentile bands.
//!
//! # Algorithm
//!
//! `DatePropagator` walks the graph in topological order, combining the
//! finish distributions of each task's dependencies with its own duration
//! distribution (or its recorded actual dates).
//!
//! # Queries
//!
//! `Forecast` answers per-task lookups, the overall month-rounded date
//! range, and the milestone timeline.
//!
//! # References
//!
//! - Vose (2008), "Risk Analysis: A Quantitative Guide", Ch. 7: Monte Carlo Simulation
//! - Malcolm et al. (1959), "Application of a Technique for Research and Development Program Evaluation"

mod forecast;
mod propagate;

pub use forecast::{DateRange, Forecast, MilestoneDates, TaskDates};
pub use propagate::DatePropagator;
