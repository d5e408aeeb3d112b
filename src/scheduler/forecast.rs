//! Propagation outputs.
//!
//! A [`Forecast`] holds the derived dates of every task for one pass. It is
//! built in full by [`DatePropagator`](super::DatePropagator) and replaced,
//! never patched, when the inputs change.

use chrono::{Datelike, Months, NaiveDate};
use std::collections::HashMap;

use crate::graph::Graph;
use crate::models::{Task, TaskId};
use crate::sim::{Band, Percentile, SimValue};

/// Derived dates of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDates {
    /// Start, in working days from the calendar epoch.
    pub start_days: SimValue,
    /// Finish, in working days from the calendar epoch.
    pub end_days: SimValue,
    /// Start as a calendar-date band.
    pub start: Band<NaiveDate>,
    /// Finish as a calendar-date band.
    pub end: Band<NaiveDate>,
}

/// Whole months covering every forecast date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day of the month of the earliest start.
    pub start: NaiveDate,
    /// Last day of the month of the latest finish.
    pub end: NaiveDate,
}

/// A milestone with its finish band.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneDates<'g> {
    pub id: TaskId,
    pub task: &'g Task,
    pub end: Percentile<NaiveDate>,
}

/// Derived dates for every task of a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    dates: HashMap<TaskId, TaskDates>,
}

impl Forecast {
    pub(crate) fn new(dates: HashMap<TaskId, TaskDates>) -> Self {
        Self { dates }
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskDates> {
        self.dates.get(&id)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &TaskDates)> + '_ {
        self.dates.iter().map(|(id, d)| (*id, d))
    }

    /// Earliest lower-bound start to latest upper-bound finish, rounded
    /// outward to whole months. Tasks with error bands are skipped; `None`
    /// if no task has a band at all.
    pub fn date_range(&self) -> Option<DateRange> {
        let start = self
            .dates
            .values()
            .filter_map(|d| d.start.as_ref().ok())
            .map(|p| p.lower)
            .min()?;
        let end = self
            .dates
            .values()
            .filter_map(|d| d.end.as_ref().ok())
            .map(|p| p.upper)
            .max()?;
        Some(DateRange {
            start: start.with_day(1)?,
            end: last_day_of_month(end)?,
        })
    }

    /// Milestones with a finish band, latest finish first.
    pub fn milestones<'g>(&self, graph: &'g Graph) -> Vec<MilestoneDates<'g>> {
        let mut out: Vec<MilestoneDates<'g>> = graph
            .tasks()
            .filter(|(_, t)| t.is_milestone())
            .filter_map(|(id, task)| {
                let end = *self.get(id)?.end.as_ref().ok()?;
                Some(MilestoneDates { id, task, end })
            })
            .collect();
        out.sort_by(|a, b| b.end.lower.cmp(&a.end.lower));
        out
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CyclePolicy, GraphBuilder};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dates(start: (NaiveDate, NaiveDate), end: (NaiveDate, NaiveDate)) -> TaskDates {
        TaskDates {
            start_days: SimValue::Scalar(0),
            end_days: SimValue::Scalar(0),
            start: Ok(Percentile {
                lower: start.0,
                median: start.0,
                upper: start.1,
            }),
            end: Ok(Percentile {
                lower: end.0,
                median: end.0,
                upper: end.1,
            }),
        }
    }

    #[test]
    fn test_date_range_rounds_to_months() {
        let mut map = HashMap::new();
        map.insert(TaskId(0), dates((d(2024, 2, 14), d(2024, 2, 20)), (d(2024, 3, 1), d(2024, 3, 9))));
        map.insert(TaskId(1), dates((d(2024, 3, 4), d(2024, 3, 5)), (d(2024, 4, 2), d(2024, 4, 18))));
        let mut broken = dates((d(2020, 1, 1), d(2020, 1, 1)), (d(2030, 1, 1), d(2030, 1, 1)));
        broken.start = Err("no estimate for task #2".into());
        broken.end = Err("no estimate for task #2".into());
        map.insert(TaskId(2), broken);

        let range = Forecast::new(map).date_range().unwrap();
        assert_eq!(range.start, d(2024, 2, 1));
        assert_eq!(range.end, d(2024, 4, 30));
    }

    #[test]
    fn test_date_range_year_end_and_leap() {
        let mut map = HashMap::new();
        map.insert(TaskId(0), dates((d(2023, 12, 31), d(2024, 1, 2)), (d(2024, 2, 3), d(2024, 2, 29))));
        let range = Forecast::new(map).date_range().unwrap();
        assert_eq!(range.start, d(2023, 12, 1));
        assert_eq!(range.end, d(2024, 2, 29));

        let mut map = HashMap::new();
        map.insert(TaskId(0), dates((d(2024, 12, 2), d(2024, 12, 3)), (d(2024, 12, 5), d(2024, 12, 31))));
        assert_eq!(Forecast::new(map).date_range().unwrap().end, d(2024, 12, 31));
    }

    #[test]
    fn test_date_range_empty() {
        assert_eq!(Forecast::default().date_range(), None);
    }

    #[test]
    fn test_milestones_latest_first() {
        let mut b = GraphBuilder::new();
        let m1 = b.task(Task::milestone("Alpha"));
        let t = b.task(Task::new("Work"));
        let m2 = b.task(Task::milestone("Beta"));
        let m3 = b.task(Task::milestone("Unplanned"));
        let g = b.build(CyclePolicy::Reject).unwrap();

        let mut map = HashMap::new();
        map.insert(m1, dates((d(2024, 2, 1), d(2024, 2, 1)), (d(2024, 2, 5), d(2024, 2, 9))));
        map.insert(t, dates((d(2024, 2, 1), d(2024, 2, 1)), (d(2024, 6, 5), d(2024, 6, 9))));
        map.insert(m2, dates((d(2024, 2, 1), d(2024, 2, 1)), (d(2024, 3, 5), d(2024, 3, 9))));
        let mut broken = dates((d(2024, 2, 1), d(2024, 2, 1)), (d(2024, 2, 1), d(2024, 2, 1)));
        broken.end = Err("no estimate for task #3".into());
        map.insert(m3, broken);

        let forecast = Forecast::new(map);
        let milestones = forecast.milestones(&g);
        let names: Vec<_> = milestones.iter().map(|m| m.task.name.as_str()).collect();
        assert_eq!(names, ["Beta", "Alpha"]);
        assert_eq!(milestones[0].id, m2);
    }
}
