//! Editing session: a graph plus everything derived from it.
//!
//! A [`Session`] owns the task graph, the calendar and the random source,
//! and keeps the [`Forecast`] and [`Layout`] in step with edits:
//!
//! 1. Edits go through [`Session::edit`] (or the calendar setters), which
//!    request a recompute instead of running one.
//! 2. The host calls [`Session::tick`] when it is ready. If a recompute is
//!    pending, the forecast and layout are rebuilt from scratch and the
//!    attached observers are notified.
//!
//! A burst of edits between two ticks costs one pass.

mod observers;
mod recompute;

pub use observers::{ChangeNotifier, ObserverId};
pub use recompute::{RecomputeRequest, RecomputeScheduler};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::errors::Result;
use crate::graph::{Graph, Layout};
use crate::models::{Calendar, Holiday};
use crate::scheduler::{DatePropagator, Forecast};
use crate::validation::{validate_graph, ValidationResult};

/// Owns a graph and its derived outputs.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_forecast::config::ForecastConfig;
/// use u_forecast::graph::Graph;
/// use u_forecast::models::{Estimate, Task};
/// use u_forecast::session::Session;
///
/// let monday = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
/// let config = ForecastConfig { seed: Some(1), ..ForecastConfig::default() };
/// let mut session = Session::new(Graph::new(), monday, config);
///
/// let id = session.edit("add task", |g| {
///     g.insert_after(Task::new("Write").with_estimate(Estimate::days(2.0, 4.0).unwrap()), None)
/// })?;
/// assert!(session.tick(monday));
/// assert!(session.forecast().get(id).unwrap().end.is_ok());
/// assert!(!session.tick(monday));
/// # Ok::<(), u_forecast::errors::ForecastError>(())
/// ```
#[derive(Debug)]
pub struct Session {
    graph: Graph,
    calendar: Calendar,
    config: ForecastConfig,
    propagator: DatePropagator,
    rng: StdRng,
    forecast: Forecast,
    layout: Layout,
    notifier: ChangeNotifier,
    recompute: RecomputeScheduler,
}

impl Session {
    /// Starts a session. The calendar epoch is `day0`; a first recompute
    /// is pending.
    pub fn new(graph: Graph, day0: NaiveDate, config: ForecastConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut recompute = RecomputeScheduler::new();
        recompute.request("session started");
        Self {
            calendar: config.calendar(day0),
            propagator: DatePropagator::from_config(&config),
            graph,
            config,
            rng,
            forecast: Forecast::default(),
            layout: Layout::default(),
            notifier: ChangeNotifier::new(),
            recompute,
        }
    }

    /// Starts a session from a TOML configuration file.
    pub fn from_config_file(
        graph: Graph,
        day0: NaiveDate,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self> {
        Ok(Self::new(graph, day0, ForecastConfig::load(path)?))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// The forecast from the latest pass.
    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    /// The layout from the latest pass.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Applies a change to the graph and requests a recompute.
    ///
    /// The closure's result is passed through, so fallible graph operations
    /// compose with `?`.
    pub fn edit<T>(&mut self, reason: &str, f: impl FnOnce(&mut Graph) -> T) -> T {
        let out = f(&mut self.graph);
        self.recompute.request(reason);
        out
    }

    /// Replaces the holidays and requests a recompute.
    pub fn set_holidays(&mut self, holidays: Vec<Holiday>) {
        self.calendar = Calendar::with_holidays(self.calendar.day0(), &holidays);
        self.config.holidays = holidays;
        self.recompute.request("holidays changed");
    }

    /// Re-sorts the graph with the configured cycle policy.
    pub fn resort(&mut self) -> Result<()> {
        self.graph.resort(self.config.cycle_policy)?;
        self.recompute.request("graph re-sorted");
        Ok(())
    }

    /// Runs the integrity checks on the current graph.
    pub fn validate(&self) -> ValidationResult {
        validate_graph(&self.graph)
    }

    /// Registers a callback run after every recompute.
    pub fn attach(&mut self, observer: impl FnMut() + 'static) -> ObserverId {
        self.notifier.attach(observer)
    }

    pub fn detach(&mut self, id: ObserverId) -> bool {
        self.notifier.detach(id)
    }

    pub fn request_recompute(&mut self, reason: &str) {
        self.recompute.request(reason);
    }

    pub fn is_pending(&self) -> bool {
        self.recompute.is_pending()
    }

    /// Runs the pending recompute, if any. Returns whether one ran.
    pub fn tick(&mut self, today: NaiveDate) -> bool {
        let Some(request) = self.recompute.take() else {
            return false;
        };
        debug!(reason = %request.reason, coalesced = request.coalesced, "recompute tick");
        self.run(today);
        true
    }

    fn run(&mut self, today: NaiveDate) {
        self.forecast =
            self.propagator
                .propagate(&self.graph, &mut self.calendar, today, &mut self.rng);
        self.layout = self.graph.layout();
        info!(
            tasks = self.graph.len(),
            columns = self.layout.column_count(),
            "forecast updated"
        );
        self.notifier.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CyclePolicy;
    use crate::models::{Estimate, Task};
    use std::cell::Cell;
    use std::rc::Rc;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()
    }

    fn seeded() -> ForecastConfig {
        ForecastConfig {
            seed: Some(42),
            ..ForecastConfig::default()
        }
    }

    fn sample_graph() -> Graph {
        let mut b = Graph::builder();
        let a = b.task(Task::new("A").with_estimate(Estimate::days(1.0, 3.0).unwrap()));
        let c = b.task(Task::new("B").with_estimate(Estimate::days(2.0, 5.0).unwrap()));
        b.depends_on(c, a);
        b.build(CyclePolicy::Reject).unwrap()
    }

    #[test]
    fn test_edits_coalesce_into_one_pass() {
        let runs = Rc::new(Cell::new(0));
        let mut s = Session::new(sample_graph(), monday(), seeded());
        let r = Rc::clone(&runs);
        s.attach(move || r.set(r.get() + 1));

        assert!(s.tick(monday()));
        assert_eq!(runs.get(), 1);

        let first = s.graph().topo()[0];
        for i in 0..3 {
            s.edit("insert", |g| g.insert_after(Task::new(format!("n{i}")), Some(first)))
                .unwrap();
        }
        assert!(s.is_pending());
        assert!(s.tick(monday()));
        assert!(!s.tick(monday()));
        assert_eq!(runs.get(), 2);
        assert_eq!(s.forecast().len(), 5);
    }

    #[test]
    fn test_forecast_and_layout_follow_graph() {
        let mut s = Session::new(sample_graph(), monday(), seeded());
        s.tick(monday());
        assert_eq!(s.layout().column_count(), 1);
        let [a, b] = [s.graph().topo()[0], s.graph().topo()[1]];
        assert!(s.forecast().get(b).unwrap().end.is_ok());

        s.edit("remove", |g| g.remove_node(a, true)).unwrap();
        s.tick(monday());
        assert!(s.forecast().get(a).is_none());
        assert_eq!(s.forecast().len(), 1);
    }

    #[test]
    fn test_seeded_sessions_agree() {
        let mut s1 = Session::new(sample_graph(), monday(), seeded());
        let mut s2 = Session::new(sample_graph(), monday(), seeded());
        s1.tick(monday());
        s2.tick(monday());
        assert_eq!(s1.forecast(), s2.forecast());
    }

    #[test]
    fn test_holidays_shift_dates() {
        let mut s = Session::new(Graph::new(), monday(), seeded());
        let t = s
            .edit("add", |g| {
                g.insert_after(
                    Task::new("T")
                        .with_started(monday())
                        .with_estimate(Estimate::days(1.0, 1.0).unwrap()),
                    None,
                )
            })
            .unwrap();
        s.tick(monday());
        let tuesday = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap();
        assert_eq!(s.forecast().get(t).unwrap().end.as_ref().unwrap().median, tuesday);

        s.set_holidays(vec![Holiday::single("Off", tuesday)]);
        s.tick(monday());
        let wednesday = NaiveDate::from_ymd_opt(2024, 2, 7).unwrap();
        assert_eq!(s.forecast().get(t).unwrap().end.as_ref().unwrap().median, wednesday);
        assert_eq!(s.config().holidays.len(), 1);
    }

    #[test]
    fn test_detached_observer_not_called() {
        let runs = Rc::new(Cell::new(0));
        let mut s = Session::new(Graph::new(), monday(), seeded());
        let r = Rc::clone(&runs);
        let id = s.attach(move || r.set(r.get() + 1));
        assert!(s.detach(id));
        s.request_recompute("manual");
        s.tick(monday());
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_validate_and_resort() {
        let mut s = Session::new(sample_graph(), monday(), seeded());
        assert!(s.validate().is_ok());
        s.tick(monday());
        s.resort().unwrap();
        assert!(s.is_pending());
    }
}
