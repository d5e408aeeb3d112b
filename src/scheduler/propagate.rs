//! Monte-Carlo date propagation.
//!
//! # Algorithm
//!
//! 1. Sample one default start distribution, `today .. today + spread`
//!    working days, shared by every task so their uncertainty stays
//!    correlated.
//! 2. Walk the graph in topological order:
//!    - start: the actual start if recorded; else the default start for
//!      tasks without dependencies; else the elementwise max of every
//!      dependency's finish and the default start.
//!    - finish: the actual finish if recorded; else start + duration, where
//!      duration is the estimate's cached distribution.
//! 3. Map both to calendar-date percentile bands.
//!
//! A missing estimate is not fatal: it becomes an error value that flows
//! into every dependent and renders as a message.
//!
//! # Complexity
//! O((V + E) * S) where S = [`SAMPLE_COUNT`](crate::sim::SAMPLE_COUNT).

use chrono::NaiveDate;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

use super::forecast::{Forecast, TaskDates};
use crate::config::ForecastConfig;
use crate::graph::Graph;
use crate::models::Calendar;
use crate::sim::{self, sample_bounded_normal, Band, SimValue};

/// Computes start and finish distributions for a task graph.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rand::{rngs::SmallRng, SeedableRng};
/// use u_forecast::graph::{CyclePolicy, Graph};
/// use u_forecast::models::{Calendar, Estimate, Task};
/// use u_forecast::scheduler::DatePropagator;
///
/// let monday = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
/// let mut b = Graph::builder();
/// let done = b.task(Task::new("Plan").with_started(monday).with_finished(monday));
/// let build = b.task(Task::new("Build").with_estimate(Estimate::days(3.0, 5.0).unwrap()));
/// b.depends_on(build, done);
/// let graph = b.build(CyclePolicy::Reject).unwrap();
///
/// let mut calendar = Calendar::new(monday, []);
/// let mut rng = SmallRng::seed_from_u64(1);
/// let forecast = DatePropagator::new().propagate(&graph, &mut calendar, monday, &mut rng);
///
/// let end = forecast.get(build).unwrap().end.clone().unwrap();
/// assert!(end.lower <= end.median && end.median <= end.upper);
/// ```
#[derive(Debug, Clone)]
pub struct DatePropagator {
    start_spread_days: f64,
}

impl Default for DatePropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl DatePropagator {
    /// Creates a propagator with a 10 working-day start spread.
    pub fn new() -> Self {
        Self {
            start_spread_days: 10.0,
        }
    }

    /// Creates a propagator from configuration.
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new().with_start_spread(config.default_start_spread_days)
    }

    /// Sets the default start spread, in working days.
    pub fn with_start_spread(mut self, days: f64) -> Self {
        self.start_spread_days = days;
        self
    }

    /// Propagates dates through `graph`.
    ///
    /// `today` anchors the default start. Estimates sample their
    /// distribution from `rng` on first use and keep it afterwards.
    pub fn propagate<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        calendar: &mut Calendar,
        today: NaiveDate,
        rng: &mut R,
    ) -> Forecast {
        let today_days = calendar.working_day_offset(today) as f64;
        let default_start =
            sample_bounded_normal(today_days, today_days + self.start_spread_days, rng);

        let mut ends: HashMap<_, SimValue> = HashMap::with_capacity(graph.len());
        let mut dates = HashMap::with_capacity(graph.len());
        let mut errors = 0usize;

        for (id, task) in graph.tasks() {
            let start = match task.started {
                Some(date) => SimValue::Scalar(calendar.working_day_offset(date)),
                None if graph.dependencies(id).is_empty() => default_start.clone(),
                None => {
                    let mut inputs: Vec<SimValue> = graph
                        .dependencies(id)
                        .iter()
                        .map(|dep| {
                            ends.get(dep).cloned().unwrap_or_else(|| {
                                SimValue::error(format!("Dependency {dep} of {id} is out of order"))
                            })
                        })
                        .collect();
                    inputs.push(default_start.clone());
                    sim::max(&inputs)
                }
            };

            let end = match task.finished {
                Some(date) => SimValue::Scalar(calendar.working_day_offset(date)),
                None => {
                    let duration = match &task.estimate {
                        Some(estimate) => estimate.distribution(rng).clone(),
                        None => SimValue::error(format!("no estimate for task {id}")),
                    };
                    sim::add(&[start.clone(), duration])
                }
            };

            let start_band = to_dates(&start, calendar);
            let end_band = to_dates(&end, calendar);
            if end_band.is_err() {
                errors += 1;
            }
            ends.insert(id, end.clone());
            dates.insert(
                id,
                TaskDates {
                    start_days: start,
                    end_days: end,
                    start: start_band,
                    end: end_band,
                },
            );
        }

        debug!(tasks = dates.len(), errors, %today, "propagated dates");
        Forecast::new(dates)
    }
}

/// Percentile band of a working-day value, as calendar dates.
fn to_dates(days: &SimValue, calendar: &mut Calendar) -> Band<NaiveDate> {
    sim::percentile(days).map(|p| p.map(|offset| calendar.date_for_offset(offset)))
}
