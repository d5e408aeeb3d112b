//! Duration estimates.
//!
//! An estimate is a 90% confidence range, e.g. "3-5 d" or "2w - 2m". It is
//! immutable: editing a task's estimate means replacing it, which also drops
//! the cached sample distribution.
//!
//! # Text Format
//! `<lower>[unit] - <upper><unit>`, whitespace tolerant. The lower unit
//! defaults to the upper one. Units: `d` (day), `w` (week = 5 days),
//! `m` (month = 20 days).

use once_cell::sync::{Lazy, OnceCell};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ForecastError;
use crate::sim::{sample_bounded_normal, SimValue};

static ESTIMATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(\.\d+)?)\s*([dwm]?)\s*-\s*(\d+(\.\d+)?)\s*([dwm])\s*$")
        .expect("valid estimate regex")
});

/// Unit of an estimate bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "m")]
    Month,
}

impl Unit {
    /// Working days per unit.
    pub fn days(self) -> f64 {
        match self {
            Unit::Day => 1.0,
            Unit::Week => 5.0,
            Unit::Month => 20.0,
        }
    }

    fn from_letter(s: &str) -> Option<Self> {
        match s {
            "d" => Some(Unit::Day),
            "w" => Some(Unit::Week),
            "m" => Some(Unit::Month),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::Day => "d",
            Unit::Week => "w",
            Unit::Month => "m",
        })
    }
}

/// A duration range with a lazily sampled distribution.
///
/// Clones share the cached distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    lower: f64,
    lower_unit: Unit,
    upper: f64,
    upper_unit: Unit,
    #[serde(skip)]
    dist: OnceCell<SimValue>,
}

impl Estimate {
    /// Creates an estimate. Fails unless `0 <= lower_days <= upper_days`.
    pub fn new(
        lower: f64,
        lower_unit: Unit,
        upper: f64,
        upper_unit: Unit,
    ) -> Result<Self, ForecastError> {
        let est = Self {
            lower,
            lower_unit,
            upper,
            upper_unit,
            dist: OnceCell::new(),
        };
        let (lb, ub) = (est.lower_days(), est.upper_days());
        if !(lb.is_finite() && ub.is_finite() && lb >= 0.0 && ub >= lb) {
            return Err(ForecastError::InvalidEstimate(est.to_string()));
        }
        Ok(est)
    }

    /// Estimate measured in days on both ends.
    pub fn days(lower: f64, upper: f64) -> Result<Self, ForecastError> {
        Self::new(lower, Unit::Day, upper, Unit::Day)
    }

    pub fn lower(&self) -> (f64, Unit) {
        (self.lower, self.lower_unit)
    }

    pub fn upper(&self) -> (f64, Unit) {
        (self.upper, self.upper_unit)
    }

    /// Lower bound in working days.
    pub fn lower_days(&self) -> f64 {
        self.lower * self.lower_unit.days()
    }

    /// Upper bound in working days.
    pub fn upper_days(&self) -> f64 {
        self.upper * self.upper_unit.days()
    }

    /// The sampled duration distribution, drawn on first use.
    pub fn distribution<R: Rng + ?Sized>(&self, rng: &mut R) -> &SimValue {
        self.dist
            .get_or_init(|| sample_bounded_normal(self.lower_days(), self.upper_days(), rng))
    }

    /// Whether the distribution has been sampled.
    pub fn is_sampled(&self) -> bool {
        self.dist.get().is_some()
    }
}

impl PartialEq for Estimate {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
            && self.lower_unit == other.lower_unit
            && self.upper == other.upper
            && self.upper_unit == other.upper_unit
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower_unit == self.upper_unit {
            write!(f, "{}-{} {}", self.lower, self.upper, self.upper_unit)
        } else {
            write!(
                f,
                "{}{} - {}{}",
                self.lower, self.lower_unit, self.upper, self.upper_unit
            )
        }
    }
}

impl FromStr for Estimate {
    type Err = ForecastError;

    /// Parses the inline-editing format.
    ///
    /// ```
    /// use u_forecast::models::Estimate;
    ///
    /// let e: Estimate = "2 - 3w".parse().unwrap();
    /// assert_eq!(e.lower_days(), 10.0);
    /// assert_eq!(e.upper_days(), 15.0);
    /// assert!("5-2d".parse::<Estimate>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ForecastError::InvalidEstimate(s.to_string());
        let caps = ESTIMATE_RE.captures(s).ok_or_else(invalid)?;
        let lower: f64 = caps[1].parse().map_err(|_| invalid())?;
        let upper: f64 = caps[4].parse().map_err(|_| invalid())?;
        let upper_unit = Unit::from_letter(&caps[6]).ok_or_else(invalid)?;
        let lower_unit = Unit::from_letter(&caps[3]).unwrap_or(upper_unit);
        Self::new(lower, lower_unit, upper, upper_unit).map_err(|_| invalid())
    }
}
