//! Values produced by graph nodes.
//!
//! Root and arithmetic nodes resolve to [`Value::Float`]; string interpolations and
//! templates resolve to [`Value::Text`]; props leaves resolve to [`Value::Record`].

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Text(String),
    Record(IndexMap<String, Value>),
}

/// Coarse classification used to reject numeric operators on text producers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Text,
    Record,
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Record(_) => ValueKind::Record,
        }
    }

    /// Numeric payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Coerce to a float; non-numeric values become `NaN`.
    pub fn to_float(&self) -> f64 {
        self.as_float().unwrap_or(f64::NAN)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => f.write_str(&format_number(*v)),
            Value::Text(s) => f.write_str(s),
            Value::Record(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Render a number the way script hosts print them: integral values carry no
/// fractional part, `-0` prints as `0`, infinities are spelled out, and very large
/// or very small magnitudes switch to exponent notation (`1e+21`, `1e-7`).
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{v:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_a_script_host() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(76.5), "76.5");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.2), "0.2");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-8), "1.5e-8");
    }

    #[test]
    fn coerces_non_numeric_to_nan() {
        assert!(Value::Text("12px".into()).to_float().is_nan());
        assert_eq!(Value::Float(3.0).to_float(), 3.0);
    }

    #[test]
    fn deserializes_untagged() {
        let v: Value = serde_json::from_str("1.5").expect("float");
        assert_eq!(v, Value::Float(1.5));
        let v: Value = serde_json::from_str("\"10deg\"").expect("text");
        assert_eq!(v.as_text(), Some("10deg"));
    }
}
