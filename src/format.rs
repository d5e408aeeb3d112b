//! Human-readable date rendering.
//!
//! Two display modes:
//! - **Absolute**: `"5 Feb"`, bands as `"5 Feb - 12 Mar"`, collapsing to
//!   `"5 - 9 Feb"` within one month. The year is shown only when it differs
//!   from today's.
//! - **Relative**: fixed dates as a year/month/day breakdown (`"1m 3d ago"`,
//!   `"2d"`, `"today"`); bands as a coarse range whose unit is picked by
//!   the distance of the lower bound (`"in 2-3 weeks"`).
//!
//! Error bands render as their message in both modes.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Task;
use crate::scheduler::TaskDates;
use crate::sim::Band;

const WEEK: i64 = 7;
/// Days per month for coarse ranges. Deliberately not calendar-accurate.
const MONTH: i64 = 31;
const YEAR: i64 = 365;

/// How dates are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Absolute,
    Relative,
}

/// Renders task dates relative to a fixed "today".
///
/// ```
/// use chrono::NaiveDate;
/// use u_forecast::format::{DateFormatter, DisplayMode};
///
/// let today = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
/// let fmt = DateFormatter::new(today, DisplayMode::Absolute);
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(fmt.date(date), "1 Mar");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    today: NaiveDate,
    mode: DisplayMode,
}

impl DateFormatter {
    pub fn new(today: NaiveDate, mode: DisplayMode) -> Self {
        Self { today, mode }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// The task's start: its actual start if recorded, else the forecast band.
    pub fn start(&self, task: &Task, dates: &TaskDates) -> String {
        self.fixed_or_band(task.started, &dates.start)
    }

    /// The task's finish: its actual finish if recorded, else the forecast band.
    pub fn end(&self, task: &Task, dates: &TaskDates) -> String {
        self.fixed_or_band(task.finished, &dates.end)
    }

    pub fn fixed_or_band(&self, fixed: Option<NaiveDate>, band: &Band<NaiveDate>) -> String {
        match fixed {
            Some(date) => self.date(date),
            None => self.band(band),
        }
    }

    /// A single known date.
    pub fn date(&self, date: NaiveDate) -> String {
        match self.mode {
            DisplayMode::Absolute => self.absolute(date),
            DisplayMode::Relative => relative_date(self.today, date),
        }
    }

    /// A percentile band, using its 5th and 95th percentile.
    pub fn band(&self, band: &Band<NaiveDate>) -> String {
        let p = match band {
            Ok(p) => p,
            Err(message) => return message.clone(),
        };
        match self.mode {
            DisplayMode::Absolute => {
                let (lb, ub) = (p.lower, p.upper);
                if lb.year() == ub.year() && lb.month() == ub.month() {
                    let mut out = format!("{} - {} {}", lb.day(), ub.day(), lb.format("%b"));
                    if lb.year() != self.today.year() {
                        out.push_str(&format!(" {}", lb.year()));
                    }
                    out
                } else {
                    format!("{} - {}", self.absolute(lb), self.absolute(ub))
                }
            }
            DisplayMode::Relative => relative_range(self.today, p.lower, p.upper),
        }
    }

    fn absolute(&self, date: NaiveDate) -> String {
        if date.year() == self.today.year() {
            date.format("%-d %b").to_string()
        } else {
            date.format("%-d %b %Y").to_string()
        }
    }
}

/// Year/month/day distance between two dates, e.g. `"1y 2m 3d ago"`.
///
/// Months are borrowed as 31 days, matching [`relative_range`].
pub fn relative_date(today: NaiveDate, target: NaiveDate) -> String {
    let (from, to, suffix) = if target < today {
        (target, today, " ago")
    } else {
        (today, target, "")
    };
    let mut years = to.year() - from.year();
    let mut months = to.month() as i32 - from.month() as i32;
    let mut days = to.day() as i32 - from.day() as i32;
    if days < 0 {
        days += MONTH as i32;
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    let parts: Vec<String> = [(years, "y"), (months, "m"), (days, "d")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect();
    if parts.is_empty() {
        "today".to_string()
    } else {
        format!("{}{suffix}", parts.join(" "))
    }
}

/// Coarse distance range, unit chosen by the lower bound: days under a
/// week, weeks under five months, months under a year, then years.
pub fn relative_range(today: NaiveDate, lower: NaiveDate, upper: NaiveDate) -> String {
    let lbd = (lower - today).num_days().abs();
    let ubd = (upper - today).num_days().abs();
    if lbd < WEEK {
        format!("in {lbd}-{ubd} days")
    } else if lbd < 5 * MONTH {
        format!("in {}-{} weeks", lbd / WEEK, ubd / WEEK)
    } else if lbd < YEAR {
        format!(
            "in {:.2}-{:.2} months",
            lbd as f64 / MONTH as f64,
            ubd as f64 / MONTH as f64
        )
    } else {
        format!(
            "in {:.2}-{:.2} years",
            lbd as f64 / YEAR as f64,
            ubd as f64 / YEAR as f64
        )
    }
}
