//! Working-day calendar.
//!
//! Converts between calendar dates and integer working-day offsets relative
//! to an epoch (`day0`), skipping weekends and holidays.
//!
//! # Offset Model
//! - Offset `0` is `day0` itself (even if `day0` falls on a weekend).
//! - Offset `n > 0` is the n-th working day after `day0`.
//! - Offset `-n` is the n-th working day before `day0`.
//! - A non-working date maps to the offset of the latest working day at or
//!   before it, so offsets never decrease as dates increase.
//!
//! # Memoization
//! Both directions are expanded lazily and only grow. `forward[i]` holds the
//! date of offset `i`; `backward[i]` holds the date of offset `-(i + 1)`.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// A named, inclusive range of non-working dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub name: String,
    /// First day off (inclusive).
    pub start: NaiveDate,
    /// Last day off (inclusive).
    pub end: NaiveDate,
}

impl Holiday {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// A single-day holiday.
    pub fn single(name: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(name, date, date)
    }

    /// Every date in the range. Empty if `end < start`.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Working-day calendar with memoized expansion.
#[derive(Debug, Clone)]
pub struct Calendar {
    day0: NaiveDate,
    holidays: HashSet<NaiveDate>,
    forward: Vec<NaiveDate>,
    backward: Vec<NaiveDate>,
}

impl Calendar {
    /// Creates a calendar anchored at `day0`.
    pub fn new(day0: NaiveDate, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            day0,
            holidays: holidays.into_iter().collect(),
            forward: vec![day0],
            backward: Vec::new(),
        }
    }

    /// Creates a calendar from holiday ranges.
    pub fn with_holidays(day0: NaiveDate, holidays: &[Holiday]) -> Self {
        Self::new(day0, holidays.iter().flat_map(|h| h.dates()))
    }

    /// The epoch.
    pub fn day0(&self) -> NaiveDate {
        self.day0
    }

    /// Whether `date` is a weekend day or a holiday.
    pub fn is_day_off(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.holidays.contains(&date)
    }

    /// Working-day offset of the local current date.
    pub fn today(&mut self) -> i64 {
        self.working_day_offset(chrono::Local::now().date_naive())
    }

    /// Working-day offset of `date` relative to `day0`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use u_forecast::models::Calendar;
    ///
    /// let monday = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
    /// let mut cal = Calendar::new(monday, []);
    /// let next_monday = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
    /// assert_eq!(cal.working_day_offset(next_monday), 5);
    /// ```
    pub fn working_day_offset(&mut self, date: NaiveDate) -> i64 {
        if date >= self.day0 {
            self.extend_forward_through(date);
            // forward[0] == day0 <= date, so the count is at least 1.
            let at_or_before = self.forward.partition_point(|d| *d <= date);
            (at_or_before - 1) as i64
        } else {
            self.extend_backward_through(date);
            let later = self.backward.partition_point(|d| *d > date);
            -(later as i64) - 1
        }
    }

    /// Date of a working-day offset. Inverse of [`working_day_offset`](Self::working_day_offset)
    /// on working days.
    pub fn date_for_offset(&mut self, offset: i64) -> NaiveDate {
        if offset >= 0 {
            let idx = offset as usize;
            while self.forward.len() <= idx {
                let next = self.next_working_day(self.last_forward());
                self.forward.push(next);
            }
            self.forward[idx]
        } else {
            let idx = (-offset - 1) as usize;
            while self.backward.len() <= idx {
                let prev = self.prev_working_day(self.last_backward());
                self.backward.push(prev);
            }
            self.backward[idx]
        }
    }

    fn last_forward(&self) -> NaiveDate {
        *self.forward.last().unwrap_or(&self.day0)
    }

    fn last_backward(&self) -> NaiveDate {
        *self.backward.last().unwrap_or(&self.day0)
    }

    /// Grows `forward` until the next working day would pass `date`.
    fn extend_forward_through(&mut self, date: NaiveDate) {
        let before = self.forward.len();
        while self.last_forward() < date {
            let next = self.next_working_day(self.last_forward());
            if next > date {
                break;
            }
            self.forward.push(next);
        }
        if self.forward.len() != before {
            trace!(from = before, to = self.forward.len(), "extended forward calendar");
        }
    }

    /// Grows `backward` until it holds a working day at or before `date`.
    fn extend_backward_through(&mut self, date: NaiveDate) {
        let before = self.backward.len();
        while self.last_backward() > date {
            let prev = self.prev_working_day(self.last_backward());
            self.backward.push(prev);
        }
        if self.backward.len() != before {
            trace!(from = before, to = self.backward.len(), "extended backward calendar");
        }
    }

    fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut d = from;
        loop {
            d = d.succ_opt().expect("calendar walked past the last representable date");
            if !self.is_day_off(d) {
                return d;
            }
        }
    }

    fn prev_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut d = from;
        loop {
            d = d.pred_opt().expect("calendar walked past the first representable date");
            if !self.is_day_off(d) {
                return d;
            }
        }
    }
}
