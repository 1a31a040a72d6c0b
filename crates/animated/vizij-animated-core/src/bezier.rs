//! Cubic-bezier easing solver.
//!
//! Inverts `x(t)` for a CSS-style curve anchored at `(0,0)` and `(1,1)` so that a
//! normalized time can be mapped to eased progress `y(x)`. The lookup starts from
//! an 11-entry sample table, refines with Newton-Raphson when the slope is steep
//! enough and falls back to bisection otherwise.

use serde::{Deserialize, Serialize};

use crate::error::{AnimatedError, Result};

const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f64 = 0.001;
const SUBDIVISION_PRECISION: f64 = 0.000_000_1;
const SUBDIVISION_MAX_ITERATIONS: usize = 10;

const SPLINE_TABLE_SIZE: usize = 11;
const SAMPLE_STEP_SIZE: f64 = 1.0 / (SPLINE_TABLE_SIZE as f64 - 1.0);

/// Control points of a unit cubic bezier, as written in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BezierPoints {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A validated bezier easing with its precomputed sample table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BezierPoints", into = "BezierPoints")]
pub struct BezierEasing {
    points: BezierPoints,
    samples: [f64; SPLINE_TABLE_SIZE],
}

#[inline]
fn coeff_a(a1: f64, a2: f64) -> f64 {
    1.0 - 3.0 * a2 + 3.0 * a1
}

#[inline]
fn coeff_b(a1: f64, a2: f64) -> f64 {
    3.0 * a2 - 6.0 * a1
}

#[inline]
fn coeff_c(a1: f64) -> f64 {
    3.0 * a1
}

/// x(t) given x1/x2, or y(t) given y1/y2.
#[inline]
fn calc_bezier(t: f64, a1: f64, a2: f64) -> f64 {
    ((coeff_a(a1, a2) * t + coeff_b(a1, a2)) * t + coeff_c(a1)) * t
}

/// dx/dt given x1/x2, or dy/dt given y1/y2.
#[inline]
fn slope(t: f64, a1: f64, a2: f64) -> f64 {
    3.0 * coeff_a(a1, a2) * t * t + 2.0 * coeff_b(a1, a2) * t + coeff_c(a1)
}

fn binary_subdivide(x: f64, mut lo: f64, mut hi: f64, x1: f64, x2: f64) -> f64 {
    let mut t = lo;
    for _ in 0..SUBDIVISION_MAX_ITERATIONS {
        t = lo + (hi - lo) / 2.0;
        let current = calc_bezier(t, x1, x2) - x;
        if current > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        if current.abs() <= SUBDIVISION_PRECISION {
            break;
        }
    }
    t
}

fn newton_raphson(x: f64, mut guess: f64, x1: f64, x2: f64) -> f64 {
    for _ in 0..NEWTON_ITERATIONS {
        let current_slope = slope(guess, x1, x2);
        if current_slope == 0.0 {
            return guess;
        }
        guess -= (calc_bezier(guess, x1, x2) - x) / current_slope;
    }
    guess
}

impl BezierEasing {
    /// Build the easing; both x control points must lie in `[0, 1]` so the curve
    /// stays a function of x.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        if !((0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2)) {
            return Err(AnimatedError::BezierOutOfRange { x1, x2 });
        }
        Ok(Self::from_points(x1, y1, x2, y2))
    }

    /// Build without validating the x control points.
    pub(crate) fn from_points(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let mut samples = [0.0; SPLINE_TABLE_SIZE];
        if x1 != y1 || x2 != y2 {
            for (i, sample) in samples.iter_mut().enumerate() {
                *sample = calc_bezier(i as f64 * SAMPLE_STEP_SIZE, x1, x2);
            }
        }
        Self {
            points: BezierPoints { x1, y1, x2, y2 },
            samples,
        }
    }

    pub fn points(&self) -> BezierPoints {
        self.points
    }

    #[inline]
    fn is_linear(&self) -> bool {
        let p = &self.points;
        p.x1 == p.y1 && p.x2 == p.y2
    }

    fn t_for_x(&self, x: f64) -> f64 {
        let BezierPoints { x1, x2, .. } = self.points;
        let last_sample = SPLINE_TABLE_SIZE - 1;
        let mut interval_start = 0.0;
        let mut current = 1;
        while current != last_sample && self.samples[current] <= x {
            interval_start += SAMPLE_STEP_SIZE;
            current += 1;
        }
        current -= 1;

        let dist =
            (x - self.samples[current]) / (self.samples[current + 1] - self.samples[current]);
        let guess = interval_start + dist * SAMPLE_STEP_SIZE;
        let initial_slope = slope(guess, x1, x2);

        if initial_slope >= NEWTON_MIN_SLOPE {
            newton_raphson(x, guess, x1, x2)
        } else if initial_slope == 0.0 {
            guess
        } else {
            binary_subdivide(x, interval_start, interval_start + SAMPLE_STEP_SIZE, x1, x2)
        }
    }

    /// Eased progress for normalized input `x`. Endpoints are exact.
    pub fn apply(&self, x: f64) -> f64 {
        if self.is_linear() {
            return x;
        }
        if x == 0.0 {
            return 0.0;
        }
        if x == 1.0 {
            return 1.0;
        }
        let BezierPoints { y1, y2, .. } = self.points;
        calc_bezier(self.t_for_x(x), y1, y2)
    }
}

impl TryFrom<BezierPoints> for BezierEasing {
    type Error = AnimatedError;

    fn try_from(p: BezierPoints) -> Result<Self> {
        BezierEasing::new(p.x1, p.y1, p.x2, p.y2)
    }
}

impl From<BezierEasing> for BezierPoints {
    fn from(easing: BezierEasing) -> Self {
        easing.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn rejects_out_of_range_x() {
        assert!(matches!(
            BezierEasing::new(1.5, 0.0, 0.5, 1.0),
            Err(AnimatedError::BezierOutOfRange { .. })
        ));
        assert!(BezierEasing::new(0.0, -2.0, 1.0, 3.0).is_ok());
    }

    #[test]
    fn linear_curve_is_identity() {
        let easing = BezierEasing::new(0.3, 0.3, 0.7, 0.7).expect("valid");
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert_eq!(easing.apply(x), x);
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let easing = BezierEasing::new(0.42, 0.0, 0.58, 1.0).expect("valid");
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let easing = BezierEasing::new(0.42, 0.0, 0.58, 1.0).expect("valid");
        approx(easing.apply(0.5), 0.5, 1e-6);
        for i in 1..10 {
            let x = i as f64 / 10.0;
            approx(easing.apply(x) + easing.apply(1.0 - x), 1.0, 1e-5);
        }
    }

    #[test]
    fn is_monotonic_for_standard_curve() {
        let easing = BezierEasing::new(0.25, 0.1, 0.25, 1.0).expect("valid");
        let mut last = 0.0;
        for i in 1..=100 {
            let y = easing.apply(i as f64 / 100.0);
            assert!(y >= last - 1e-9, "not monotonic at {i}: {y} < {last}");
            last = y;
        }
    }

    #[test]
    fn inverts_x_accurately() {
        let easing = BezierEasing::new(0.1, 0.7, 0.9, 0.2).expect("valid");
        for i in 1..20 {
            let x = i as f64 / 20.0;
            let t = easing.t_for_x(x);
            approx(calc_bezier(t, 0.1, 0.9), x, 1e-4);
        }
    }

    #[test]
    fn round_trips_through_serde() {
        let easing: BezierEasing =
            serde_json::from_str(r#"{"x1":0.42,"y1":0.0,"x2":1.0,"y2":1.0}"#).expect("parse");
        assert_eq!(easing.points().x1, 0.42);
        let bad = serde_json::from_str::<BezierEasing>(r#"{"x1":2.0,"y1":0.0,"x2":1.0,"y2":1.0}"#);
        assert!(bad.is_err());
    }
}
