//! Vectorized Monte-Carlo values.
//!
//! A [`SimValue`] is either a known scalar, a fixed-size array of
//! [`SAMPLE_COUNT`] samples, or an error message. The combinators
//! ([`add`], [`max`], [`percentile`]) work elementwise over the samples,
//! broadcasting scalars, and short-circuit on the first error.
//!
//! All quantities are whole working days: durations are floored when
//! sampled, and offsets produced by a [`Calendar`](crate::models::Calendar)
//! are integers.
//!
//! # Sharing
//! Sample arrays are reference-counted. Reusing one array across several
//! consumers (the shared default start of every root task, an estimate's
//! cached distribution) keeps their uncertainty correlated and costs no
//! copies.

mod sampler;

pub use sampler::sample_bounded_normal;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of samples carried by every array value.
pub const SAMPLE_COUNT: usize = 1000;

/// A fixed-size block of samples.
pub type Samples = Arc<[i64; SAMPLE_COUNT]>;

/// A simulated quantity, in working days.
#[derive(Debug, Clone, PartialEq)]
pub enum SimValue {
    /// A known, fixed quantity.
    Scalar(i64),
    /// [`SAMPLE_COUNT`] equally likely outcomes.
    Array(Samples),
    /// The quantity cannot be computed; carries a displayable reason.
    Error(String),
}

impl SimValue {
    /// Creates an error value.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Wraps a sample block.
    pub fn array(samples: [i64; SAMPLE_COUNT]) -> Self {
        Self::Array(Arc::new(samples))
    }

    /// Whether this value is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// 5th percentile, median and 95th percentile of a simulated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percentile<T> {
    /// 5th percentile.
    pub lower: T,
    /// 50th percentile.
    pub median: T,
    /// 95th percentile.
    pub upper: T,
}

impl<T: Copy> Percentile<T> {
    /// All three points equal `value`.
    pub fn flat(value: T) -> Self {
        Self {
            lower: value,
            median: value,
            upper: value,
        }
    }

    /// Applies `f` to each point, in lower/median/upper order.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Percentile<U> {
        Percentile {
            lower: f(self.lower),
            median: f(self.median),
            upper: f(self.upper),
        }
    }
}

/// A percentile band or the error that prevented computing it.
pub type Band<T> = Result<Percentile<T>, String>;

/// Scalars and sample blocks pulled out of a list of values.
struct Coalesced<'a> {
    scalars: Vec<i64>,
    arrays: Vec<&'a [i64; SAMPLE_COUNT]>,
}

/// Splits values into scalars and arrays, or returns the first error.
fn coalesce(values: &[SimValue]) -> Result<Coalesced<'_>, String> {
    if let Some(SimValue::Error(message)) = values.iter().find(|v| v.is_error()) {
        return Err(message.clone());
    }
    let mut out = Coalesced {
        scalars: Vec::new(),
        arrays: Vec::new(),
    };
    for v in values {
        match v {
            SimValue::Scalar(s) => out.scalars.push(*s),
            SimValue::Array(a) => out.arrays.push(a),
            SimValue::Error(_) => unreachable!("errors are returned above"),
        }
    }
    Ok(out)
}

/// Combines values elementwise, folding scalars into a single accumulator.
fn combine(values: &[SimValue], init: i64, op: impl Fn(i64, i64) -> i64) -> SimValue {
    let Coalesced { scalars, arrays } = match coalesce(values) {
        Ok(c) => c,
        Err(message) => return SimValue::Error(message),
    };
    let acc = scalars.into_iter().fold(init, &op);
    if arrays.is_empty() {
        return SimValue::Scalar(acc);
    }
    let mut out = [0i64; SAMPLE_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = arrays.iter().fold(acc, |a, arr| op(a, arr[i]));
    }
    SimValue::array(out)
}

/// Elementwise sum.
///
/// ```
/// use u_forecast::sim::{add, SimValue};
///
/// assert_eq!(add(&[SimValue::Scalar(2), SimValue::Scalar(3)]), SimValue::Scalar(5));
/// assert_eq!(add(&[]), SimValue::Scalar(0));
/// ```
pub fn add(values: &[SimValue]) -> SimValue {
    combine(values, 0, |a, b| a + b)
}

/// Elementwise maximum.
///
/// With no inputs at all the result is `Scalar(i64::MIN)`, the identity
/// of the fold.
pub fn max(values: &[SimValue]) -> SimValue {
    combine(values, i64::MIN, i64::max)
}

/// Extracts the 5th/50th/95th percentile points.
///
/// Scalars produce a flat band; arrays are sorted (on a copy) and sampled at
/// `floor(n * 0.05)`, `floor(n * 0.5)` and `floor(n * 0.95)`.
pub fn percentile(value: &SimValue) -> Band<i64> {
    match value {
        SimValue::Scalar(s) => Ok(Percentile::flat(*s)),
        SimValue::Error(message) => Err(message.clone()),
        SimValue::Array(samples) => {
            let mut sorted = **samples;
            sorted.sort_unstable();
            let n = sorted.len();
            Ok(Percentile {
                lower: sorted[n * 5 / 100],
                median: sorted[n / 2],
                upper: sorted[n * 95 / 100],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(offset: i64) -> SimValue {
        let mut a = [0i64; SAMPLE_COUNT];
        for (i, v) in a.iter_mut().enumerate() {
            *v = i as i64 + offset;
        }
        SimValue::array(a)
    }

    #[test]
    fn test_error_short_circuits() {
        let err = SimValue::error("x");
        assert_eq!(add(&[err.clone(), SimValue::Scalar(3)]), SimValue::error("x"));
        assert_eq!(max(&[SimValue::Scalar(1), err]), SimValue::error("x"));
    }

    #[test]
    fn test_first_error_wins() {
        let v = add(&[ramp(0), SimValue::error("first"), SimValue::error("second")]);
        assert_eq!(v, SimValue::error("first"));
    }

    #[test]
    fn test_scalar_only() {
        assert_eq!(add(&[SimValue::Scalar(4), SimValue::Scalar(-1)]), SimValue::Scalar(3));
        assert_eq!(max(&[SimValue::Scalar(4), SimValue::Scalar(9)]), SimValue::Scalar(9));
    }

    #[test]
    fn test_add_broadcasts_scalar() {
        let SimValue::Array(out) = add(&[ramp(0), SimValue::Scalar(5), ramp(1)]) else {
            panic!("expected array");
        };
        assert_eq!(out[0], 6);
        assert_eq!(out[10], 10 + 5 + 11);
        assert_eq!(out[SAMPLE_COUNT - 1], 2 * 999 + 6);
    }

    #[test]
    fn test_max_elementwise() {
        let SimValue::Array(out) = max(&[ramp(0), SimValue::Scalar(500)]) else {
            panic!("expected array");
        };
        assert_eq!(out[0], 500);
        assert_eq!(out[499], 500);
        assert_eq!(out[700], 700);
    }

    #[test]
    fn test_percentile_scalar() {
        assert_eq!(percentile(&SimValue::Scalar(7)), Ok(Percentile::flat(7)));
    }

    #[test]
    fn test_percentile_array() {
        let mut a = [0i64; SAMPLE_COUNT];
        for (i, v) in a.iter_mut().enumerate() {
            *v = (SAMPLE_COUNT - i) as i64; // descending, so the sort matters
        }
        let p = percentile(&SimValue::array(a)).unwrap();
        assert_eq!(p.lower, 51);
        assert_eq!(p.median, 501);
        assert_eq!(p.upper, 951);
    }

    #[test]
    fn test_percentile_error() {
        assert_eq!(percentile(&SimValue::error("no estimate")), Err("no estimate".to_string()));
    }

    #[test]
    fn test_percentile_map() {
        let p = Percentile { lower: 1, median: 2, upper: 3 }.map(|v| v * 10);
        assert_eq!(p, Percentile { lower: 10, median: 20, upper: 30 });
    }
}
