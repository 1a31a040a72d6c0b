//! Easing functions mapping normalized time to normalized progress.
//!
//! Curves are a closed, serializable set so configurations can round-trip through
//! JSON; hosts that need something bespoke can wrap a closure in [`Easing::Custom`].

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::bezier::BezierEasing;
use crate::error::Result;

/// Host-supplied easing closure.
pub type EasingFn = Rc<dyn Fn(f64) -> f64>;

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "args")]
pub enum Easing {
    #[default]
    Linear,
    /// 1 for any positive input.
    Step0,
    /// 1 once the input reaches 1.
    Step1,
    /// Standard `bezier(0.42, 0, 1, 1)` ease.
    Ease,
    Quad,
    Cubic,
    Poly(f64),
    Sin,
    Circle,
    Exp,
    /// Elastic overshoot; the argument is the bounciness (1 overshoots once).
    Elastic(f64),
    /// Anticipation curve with overshoot factor `s`.
    Back(f64),
    Bounce,
    Bezier(BezierEasing),
    /// Identity wrapper kept for readable compositions (`in(quad)`).
    In(Box<Easing>),
    /// Runs the wrapped curve backwards.
    Out(Box<Easing>),
    /// Makes the wrapped curve symmetrical.
    InOut(Box<Easing>),
    #[serde(skip)]
    Custom(EasingFn),
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("Linear"),
            Easing::Step0 => f.write_str("Step0"),
            Easing::Step1 => f.write_str("Step1"),
            Easing::Ease => f.write_str("Ease"),
            Easing::Quad => f.write_str("Quad"),
            Easing::Cubic => f.write_str("Cubic"),
            Easing::Poly(n) => f.debug_tuple("Poly").field(n).finish(),
            Easing::Sin => f.write_str("Sin"),
            Easing::Circle => f.write_str("Circle"),
            Easing::Exp => f.write_str("Exp"),
            Easing::Elastic(b) => f.debug_tuple("Elastic").field(b).finish(),
            Easing::Back(s) => f.debug_tuple("Back").field(s).finish(),
            Easing::Bounce => f.write_str("Bounce"),
            Easing::Bezier(b) => f.debug_tuple("Bezier").field(&b.points()).finish(),
            Easing::In(e) => f.debug_tuple("In").field(e).finish(),
            Easing::Out(e) => f.debug_tuple("Out").field(e).finish(),
            Easing::InOut(e) => f.debug_tuple("InOut").field(e).finish(),
            Easing::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn ease_curve(t: f64) -> f64 {
    static EASE: OnceLock<BezierEasing> = OnceLock::new();
    EASE.get_or_init(|| BezierEasing::from_points(0.42, 0.0, 1.0, 1.0))
        .apply(t)
}

fn bounce(t: f64) -> f64 {
    if t < 1.0 / 2.75 {
        return 7.5625 * t * t;
    }
    if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        return 7.5625 * t * t + 0.75;
    }
    if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        return 7.5625 * t * t + 0.9375;
    }
    let t = t - 2.625 / 2.75;
    7.5625 * t * t + 0.984375
}

impl Easing {
    /// Evaluate the curve at `t`. Inputs outside `[0, 1]` are passed through to the
    /// underlying formula so extrapolating interpolations keep their slope.
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::Step0 => {
                if t > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Easing::Step1 => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Easing::Ease => ease_curve(t),
            Easing::Quad => t * t,
            Easing::Cubic => t * t * t,
            Easing::Poly(n) => t.powf(*n),
            Easing::Sin => 1.0 - (t * PI / 2.0).cos(),
            Easing::Circle => 1.0 - (1.0 - t * t).sqrt(),
            Easing::Exp => 2f64.powf(10.0 * (t - 1.0)),
            Easing::Elastic(bounciness) => {
                let p = bounciness * PI;
                1.0 - (t * PI / 2.0).cos().powi(3) * (t * p).cos()
            }
            Easing::Back(s) => t * t * ((s + 1.0) * t - s),
            Easing::Bounce => bounce(t),
            Easing::Bezier(curve) => curve.apply(t),
            Easing::In(inner) => inner.apply(t),
            Easing::Out(inner) => 1.0 - inner.apply(1.0 - t),
            Easing::InOut(inner) => {
                if t < 0.5 {
                    inner.apply(t * 2.0) / 2.0
                } else {
                    1.0 - inner.apply((1.0 - t) * 2.0) / 2.0
                }
            }
            Easing::Custom(f) => f(t),
        }
    }

    pub fn bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        Ok(Easing::Bezier(BezierEasing::new(x1, y1, x2, y2)?))
    }

    pub fn poly(n: f64) -> Self {
        Easing::Poly(n)
    }

    /// Elastic with the default bounciness of 1.
    pub fn elastic() -> Self {
        Easing::Elastic(1.0)
    }

    /// Back with the default overshoot of 1.70158.
    pub fn back() -> Self {
        Easing::Back(1.70158)
    }

    pub fn ease_in(inner: Easing) -> Self {
        Easing::In(Box::new(inner))
    }

    pub fn ease_out(inner: Easing) -> Self {
        Easing::Out(Box::new(inner))
    }

    pub fn ease_in_out(inner: Easing) -> Self {
        Easing::InOut(Box::new(inner))
    }

    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Easing::Custom(Rc::new(f))
    }

    /// Default curve of timing drivers: `in_out(ease)`.
    pub fn timing_default() -> Self {
        Easing::ease_in_out(Easing::Ease)
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Easing::Linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn basic_curves() {
        assert_eq!(Easing::Linear.apply(0.3), 0.3);
        assert_eq!(Easing::Quad.apply(0.5), 0.25);
        assert_eq!(Easing::Cubic.apply(0.5), 0.125);
        assert_eq!(Easing::Poly(4.0).apply(0.5), 0.0625);
        assert_eq!(Easing::Step0.apply(0.0), 0.0);
        assert_eq!(Easing::Step0.apply(0.01), 1.0);
        assert_eq!(Easing::Step1.apply(0.99), 0.0);
        assert_eq!(Easing::Step1.apply(1.0), 1.0);
        assert_abs_diff_eq!(Easing::Sin.apply(1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Easing::Circle.apply(1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Easing::Exp.apply(1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Easing::Bounce.apply(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_reverses_and_in_out_is_symmetric() {
        assert_eq!(Easing::ease_in(Easing::Quad).apply(0.5), 0.25);
        let out = Easing::ease_out(Easing::Quad);
        assert_abs_diff_eq!(out.apply(0.5), 0.75, epsilon = 1e-12);
        let in_out = Easing::ease_in_out(Easing::Quad);
        assert_abs_diff_eq!(in_out.apply(0.25), 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(in_out.apply(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(in_out.apply(0.75), 0.875, epsilon = 1e-12);
    }

    #[test]
    fn timing_default_hits_endpoints() {
        let easing = Easing::timing_default();
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        assert_abs_diff_eq!(easing.apply(0.5), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn back_dips_below_zero() {
        assert!(Easing::back().apply(0.2) < 0.0);
        assert_abs_diff_eq!(Easing::elastic().apply(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn parses_from_json() {
        let easing: Easing = serde_json::from_str(r#"{"type":"poly","args":3.0}"#).expect("poly");
        assert_eq!(easing.apply(0.5), 0.125);
        let easing: Easing =
            serde_json::from_str(r#"{"type":"inOut","args":{"type":"quad"}}"#).expect("inOut");
        assert_abs_diff_eq!(easing.apply(0.25), 0.125, epsilon = 1e-12);
        let easing: Easing = serde_json::from_str(
            r#"{"type":"bezier","args":{"x1":0.42,"y1":0.0,"x2":0.58,"y2":1.0}}"#,
        )
        .expect("bezier");
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn custom_closures_apply() {
        let easing = Easing::custom(|t| t * 2.0);
        assert_eq!(easing.apply(0.25), 0.5);
        assert_eq!(format!("{easing:?}"), "Custom(..)");
    }
}
