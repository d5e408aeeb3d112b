//! Bounded-normal sampler.
//!
//! # Algorithm
//! Box–Muller transform, producing samples in pairs. The distribution is
//! chosen so that its 5th and 95th percentiles sit on the given bounds:
//! `sigma = (ub - lb) / 3.29`, `mean = (ub + lb) / 2`. Each sample is
//! floored to a whole day and clamped at zero.

use rand::Rng;
use std::f64::consts::TAU;

use super::{SimValue, SAMPLE_COUNT};

/// Width of a centered 90% interval of the standard normal, in sigmas.
const NORMAL_90_WIDTH: f64 = 3.29;

/// Draws [`SAMPLE_COUNT`] samples whose 90% interval is `[lower_90, upper_90]`.
///
/// The random source is injected so callers can seed it.
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_forecast::sim::{sample_bounded_normal, SimValue};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let SimValue::Array(samples) = sample_bounded_normal(2.0, 4.0, &mut rng) else { unreachable!() };
/// assert!(samples.iter().all(|&s| s >= 0));
/// ```
pub fn sample_bounded_normal<R: Rng + ?Sized>(lower_90: f64, upper_90: f64, rng: &mut R) -> SimValue {
    let sigma = (upper_90 - lower_90) / NORMAL_90_WIDTH;
    let mean = (upper_90 + lower_90) / 2.0;
    let mut out = [0i64; SAMPLE_COUNT];
    for pair in out.chunks_mut(2) {
        // u1 in (0, 1] keeps ln() finite.
        let u1 = 1.0 - rng.random::<f64>();
        let u2 = rng.random::<f64>();
        let mag = sigma * (-2.0 * u1.ln()).sqrt();
        let (sin, cos) = (TAU * u2).sin_cos();
        pair[0] = to_days(mag * cos + mean);
        if let Some(second) = pair.get_mut(1) {
            *second = to_days(mag * sin + mean);
        }
    }
    SimValue::array(out)
}

#[inline]
fn to_days(x: f64) -> i64 {
    (x.floor() as i64).max(0)
}
