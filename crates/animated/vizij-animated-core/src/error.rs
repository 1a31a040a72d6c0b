//! Error type shared by every fallible constructor in the crate.
//!
//! All variants describe programmer errors (malformed configuration or mismatched
//! shapes). They are surfaced immediately and never retried.

use thiserror::Error;

/// Errors raised while building or evaluating animated graphs.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimatedError {
    /// A range has fewer than two samples.
    #[error("{name} must have at least 2 elements")]
    RangeTooShort { name: &'static str },

    /// The input range decreases somewhere.
    #[error("inputRange must be monotonically non-decreasing {range:?}")]
    NonMonotonicInputRange { range: Vec<f64> },

    /// A two-sample range spanning ]-infinity;+infinity[.
    #[error("{name} cannot be ]-infinity;+infinity[ {range:?}")]
    UnboundedRange { name: &'static str, range: Vec<f64> },

    /// Input and output ranges differ in length.
    #[error("inputRange ({input}) and outputRange ({output}) must have the same length")]
    RangeLengthMismatch { input: usize, output: usize },

    /// Two string samples do not share the same non-numeric shape.
    #[error("invalid pattern {first} and {other}")]
    PatternMismatch { first: String, other: String },

    /// A numeric operation was wired onto a node that produces text or records.
    #[error("cannot interpolate an input which is not a number ({context})")]
    NonNumericInput { context: String },

    /// Spring parameters mix the two exclusive parameterisations.
    #[error("you can only define bounciness/speed or tension/friction but not both")]
    SpringParameterConflict,

    /// Bezier control point abscissae must stay inside the unit interval.
    #[error("bezier x values must be in [0, 1] range (got x1={x1}, x2={x2})")]
    BezierOutOfRange { x1: f64, x2: f64 },

    /// Template literal has the wrong number of string fragments.
    #[error("template expects {expected} string fragments, got {actual}")]
    TemplateArity { expected: usize, actual: usize },

    /// An event mapping and the event payload disagree in shape.
    #[error("bad mapping for key {key}: {reason}")]
    EventMapping { key: String, reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnimatedError>;
