//! Piecewise range mapping with easing and extrapolation.
//!
//! An [`Interpolation`] maps a number onto either a number or a string. String
//! outputs are handled by pulling every numeric token out of each sample, mapping
//! each token position with its own numeric interpolation, and writing the results
//! back into the first sample.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::color::color_to_rgba;
use crate::easing::Easing;
use crate::error::{AnimatedError, Result};
use crate::value::{format_number, Value};

/// Behaviour for inputs outside the configured input range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolate {
    /// Keep following the slope of the outermost segment.
    #[default]
    Extend,
    /// Return the input unchanged.
    Identity,
    /// Pin the input to the range boundary.
    Clamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRange {
    Numbers(Vec<f64>),
    Strings(Vec<String>),
}

impl Default for OutputRange {
    fn default() -> Self {
        OutputRange::Numbers(Vec::new())
    }
}

impl From<Vec<f64>> for OutputRange {
    fn from(v: Vec<f64>) -> Self {
        OutputRange::Numbers(v)
    }
}

impl From<Vec<&str>> for OutputRange {
    fn from(v: Vec<&str>) -> Self {
        OutputRange::Strings(v.into_iter().map(str::to_string).collect())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    pub input_range: Vec<f64>,
    pub output_range: OutputRange,
    pub easing: Easing,
    /// Applies to both sides unless a side-specific policy is set.
    pub extrapolate: Option<Extrapolate>,
    pub extrapolate_left: Option<Extrapolate>,
    pub extrapolate_right: Option<Extrapolate>,
}

impl InterpolationConfig {
    pub fn new(input_range: Vec<f64>, output_range: impl Into<OutputRange>) -> Self {
        Self {
            input_range,
            output_range: output_range.into(),
            ..Self::default()
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_extrapolate(mut self, extrapolate: Extrapolate) -> Self {
        self.extrapolate = Some(extrapolate);
        self
    }

    pub fn with_extrapolate_left(mut self, extrapolate: Extrapolate) -> Self {
        self.extrapolate_left = Some(extrapolate);
        self
    }

    pub fn with_extrapolate_right(mut self, extrapolate: Extrapolate) -> Self {
        self.extrapolate_right = Some(extrapolate);
        self
    }

    fn resolved_left(&self) -> Extrapolate {
        self.extrapolate_left
            .or(self.extrapolate)
            .unwrap_or_default()
    }

    fn resolved_right(&self) -> Extrapolate {
        self.extrapolate_right
            .or(self.extrapolate)
            .unwrap_or_default()
    }
}

/// A validated numeric mapping.
#[derive(Clone, Debug)]
pub struct NumericInterpolation {
    input_range: Vec<f64>,
    output_range: Vec<f64>,
    easing: Easing,
    left: Extrapolate,
    right: Extrapolate,
}

/// A validated string mapping: one numeric mapping per token position.
#[derive(Clone, Debug)]
pub struct StringInterpolation {
    template: String,
    tokens: Vec<NumericInterpolation>,
    round_channels: bool,
}

/// The compiled form of an [`InterpolationConfig`].
#[derive(Clone, Debug)]
pub enum Interpolation {
    Numeric(NumericInterpolation),
    Text(StringInterpolation),
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9.\-]+").expect("static token pattern is valid"))
}

fn rgb_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\s*rgba?\s*\(").expect("static rgb pattern is valid"))
}

fn check_input_range(range: &[f64]) -> Result<()> {
    if range.len() < 2 {
        return Err(AnimatedError::RangeTooShort {
            name: "input_range",
        });
    }
    if range.windows(2).any(|w| !(w[1] >= w[0])) {
        return Err(AnimatedError::NonMonotonicInputRange {
            range: range.to_vec(),
        });
    }
    Ok(())
}

fn check_bounded(name: &'static str, range: &[f64]) -> Result<()> {
    if range.len() < 2 {
        return Err(AnimatedError::RangeTooShort { name });
    }
    if range.len() == 2 && range[0] == f64::NEG_INFINITY && range[1] == f64::INFINITY {
        return Err(AnimatedError::UnboundedRange {
            name,
            range: range.to_vec(),
        });
    }
    Ok(())
}

/// Index of the segment `input` falls in; ties go to the lower segment.
fn find_range(input: f64, input_range: &[f64]) -> usize {
    let mut i = 1;
    while i < input_range.len() - 1 {
        if input_range[i] >= input {
            break;
        }
        i += 1;
    }
    i - 1
}

#[allow(clippy::too_many_arguments)]
fn interpolate_segment(
    input: f64,
    input_min: f64,
    input_max: f64,
    output_min: f64,
    output_max: f64,
    easing: &Easing,
    left: Extrapolate,
    right: Extrapolate,
) -> f64 {
    let mut result = input;

    if result < input_min {
        match left {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_min,
            Extrapolate::Extend => {}
        }
    }
    if result > input_max {
        match right {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_max,
            Extrapolate::Extend => {}
        }
    }

    if output_min == output_max {
        return output_min;
    }
    if input_min == input_max {
        return if input <= input_min {
            output_min
        } else {
            output_max
        };
    }

    if input_min == f64::NEG_INFINITY {
        result = -result;
    } else if input_max == f64::INFINITY {
        result -= input_min;
    } else {
        result = (result - input_min) / (input_max - input_min);
    }

    result = easing.apply(result);

    if output_min == f64::NEG_INFINITY {
        -result
    } else if output_max == f64::INFINITY {
        result + output_min
    } else {
        result * (output_max - output_min) + output_min
    }
}

impl NumericInterpolation {
    fn build(config: &InterpolationConfig, output_range: Vec<f64>) -> Result<Self> {
        check_input_range(&config.input_range)?;
        check_bounded("input_range", &config.input_range)?;
        check_bounded("output_range", &output_range)?;
        if config.input_range.len() != output_range.len() {
            return Err(AnimatedError::RangeLengthMismatch {
                input: config.input_range.len(),
                output: output_range.len(),
            });
        }
        Ok(Self {
            input_range: config.input_range.clone(),
            output_range,
            easing: config.easing.clone(),
            left: config.resolved_left(),
            right: config.resolved_right(),
        })
    }

    pub fn evaluate(&self, input: f64) -> f64 {
        let i = find_range(input, &self.input_range);
        interpolate_segment(
            input,
            self.input_range[i],
            self.input_range[i + 1],
            self.output_range[i],
            self.output_range[i + 1],
            &self.easing,
            self.left,
            self.right,
        )
    }
}

impl StringInterpolation {
    fn build(config: &InterpolationConfig, samples: &[String]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(AnimatedError::RangeTooShort {
                name: "output_range",
            });
        }
        let pattern = token_pattern();
        let round_channels = samples.iter().all(|s| rgb_prefix().is_match(s));
        let canonical: Vec<String> = samples.iter().map(|s| color_to_rgba(s)).collect();

        let shape = pattern.replace_all(&canonical[0], "");
        for other in &canonical[1..] {
            if pattern.replace_all(other, "") != shape {
                return Err(AnimatedError::PatternMismatch {
                    first: canonical[0].clone(),
                    other: other.clone(),
                });
            }
        }

        let columns: Vec<Vec<f64>> = canonical
            .iter()
            .map(|sample| {
                pattern
                    .find_iter(sample)
                    .map(|m| m.as_str().parse::<f64>().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();
        let token_count = columns[0].len();
        if columns.iter().any(|c| c.len() != token_count) {
            return Err(AnimatedError::PatternMismatch {
                first: canonical[0].clone(),
                other: canonical
                    .iter()
                    .zip(&columns)
                    .find(|(_, c)| c.len() != token_count)
                    .map(|(s, _)| s.clone())
                    .unwrap_or_default(),
            });
        }
        if token_count == 0 {
            check_input_range(&config.input_range)?;
        }

        let tokens = (0..token_count)
            .map(|t| {
                let outputs = columns.iter().map(|c| c[t]).collect();
                NumericInterpolation::build(config, outputs)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            template: canonical[0].clone(),
            tokens,
            round_channels,
        })
    }

    pub fn evaluate(&self, input: f64) -> String {
        let mut index = 0;
        token_pattern()
            .replace_all(&self.template, |_: &regex::Captures<'_>| {
                let value = self
                    .tokens
                    .get(index)
                    .map_or(f64::NAN, |token| token.evaluate(input));
                index += 1;
                if self.round_channels && index < 4 {
                    format_number(js_round(value))
                } else {
                    format_number(value)
                }
            })
            .into_owned()
    }
}

/// Round half toward positive infinity.
fn js_round(v: f64) -> f64 {
    (v + 0.5).floor()
}

impl Interpolation {
    /// Validate `config` and compile it.
    pub fn create(config: &InterpolationConfig) -> Result<Self> {
        match &config.output_range {
            OutputRange::Numbers(values) => {
                NumericInterpolation::build(config, values.clone()).map(Interpolation::Numeric)
            }
            OutputRange::Strings(samples) => {
                StringInterpolation::build(config, samples).map(Interpolation::Text)
            }
        }
    }

    pub fn evaluate(&self, input: f64) -> Value {
        match self {
            Interpolation::Numeric(n) => Value::Float(n.evaluate(input)),
            Interpolation::Text(s) => Value::Text(s.evaluate(input)),
        }
    }

    pub fn produces_text(&self) -> bool {
        matches!(self, Interpolation::Text(_))
    }
}
