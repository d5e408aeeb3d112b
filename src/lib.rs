//! Probabilistic project forecasting.
//!
//! Models a project as a DAG of tasks with uncertain duration estimates and
//! propagates that uncertainty through the dependencies with a vectorized
//! Monte-Carlo simulation, yielding per-task start/finish date bands in
//! working-day calendar terms.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `TaskId`, `Estimate`, `Calendar`, `Holiday`
//! - **`sim`**: Fixed-size sample arrays and their elementwise combinators
//! - **`graph`**: Task graph with maintained topological order, mutations, lane layout
//! - **`scheduler`**: Date propagation and forecast queries
//! - **`validation`**: Graph integrity checks (adjacency, order, cycles, estimates)
//! - **`format`**: Absolute and relative date rendering
//! - **`session`**: Graph ownership, coalesced recomputes, change notification
//! - **`config`**: TOML configuration
//! - **`logging`**: Subscriber setup (feature `logging`)
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rand::{rngs::SmallRng, SeedableRng};
//! use u_forecast::graph::{CyclePolicy, Graph};
//! use u_forecast::models::{Calendar, Task};
//! use u_forecast::scheduler::DatePropagator;
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
//! let mut b = Graph::builder();
//! let design = b.task(Task::new("Design").with_estimate("3-5d".parse().unwrap()));
//! let build = b.task(Task::new("Build").with_estimate("1-2w".parse().unwrap()));
//! let ship = b.task(Task::milestone("Ship").with_estimate("0-1d".parse().unwrap()));
//! b.depends_on(build, design).depends_on(ship, build);
//! let graph = b.build(CyclePolicy::Reject).unwrap();
//!
//! let mut calendar = Calendar::new(monday, []);
//! let forecast = DatePropagator::new().propagate(
//!     &graph,
//!     &mut calendar,
//!     monday,
//!     &mut SmallRng::seed_from_u64(7),
//! );
//! let ship_dates = forecast.get(ship).unwrap().end.clone().unwrap();
//! assert!(ship_dates.lower > monday);
//! assert_eq!(graph.layout().column_count(), 1);
//! ```
//!
//! # References
//!
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)
//! - Box & Muller (1958), "A Note on the Generation of Random Normal Deviates"
//! - Vose (2008), "Risk Analysis: A Quantitative Guide"

pub mod config;
pub mod errors;
pub mod format;
pub mod graph;
#[cfg(feature = "logging")]
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod session;
pub mod sim;
pub mod validation;
