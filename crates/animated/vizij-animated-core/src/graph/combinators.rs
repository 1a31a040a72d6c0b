//! Pure derived nodes.
//!
//! Constructors only build the node; it stays dormant until a consumer registers
//! with it.

use super::{Entry, Node, NodeKind};
use crate::error::{AnimatedError, Result};
use crate::interpolation::{Interpolation, InterpolationConfig};
use crate::value::ValueKind;

fn require_numeric(node: &Node, context: &str) -> Result<()> {
    match node.output_kind() {
        ValueKind::Float => Ok(()),
        other => Err(AnimatedError::NonNumericInput {
            context: format!("{context} over a {other:?} node"),
        }),
    }
}

/// Range-map `parent` through `config`.
pub fn interpolate(parent: Node, config: &InterpolationConfig) -> Result<Node> {
    require_numeric(&parent, "interpolation")?;
    let interpolation = Interpolation::create(config)?;
    Ok(Node::new(NodeKind::Interpolation {
        parent,
        interpolation,
    }))
}

/// `a + b`. Plain numbers are wrapped into fresh root values.
pub fn add(a: impl Into<Node>, b: impl Into<Node>) -> Result<Node> {
    let (a, b) = (a.into(), b.into());
    require_numeric(&a, "addition")?;
    require_numeric(&b, "addition")?;
    Ok(Node::new(NodeKind::Addition { a, b }))
}

/// `a * b`.
pub fn multiply(a: impl Into<Node>, b: impl Into<Node>) -> Result<Node> {
    let (a, b) = (a.into(), b.into());
    require_numeric(&a, "multiplication")?;
    require_numeric(&b, "multiplication")?;
    Ok(Node::new(NodeKind::Multiplication { a, b }))
}

/// Euclidean-style modulo: the result always has the sign of `modulus`.
pub fn modulo(a: impl Into<Node>, modulus: f64) -> Result<Node> {
    let a = a.into();
    require_numeric(&a, "modulo")?;
    Ok(Node::new(NodeKind::Modulo { a, modulus }))
}

/// Tagged-template node: `strings[0] + values[0] + strings[1] + ...`.
///
/// `strings` must have exactly one more fragment than `values`.
pub fn template(strings: Vec<String>, values: Vec<Entry>) -> Result<Node> {
    if strings.len() != values.len() + 1 {
        return Err(AnimatedError::TemplateArity {
            expected: values.len() + 1,
            actual: strings.len(),
        });
    }
    Ok(Node::new(NodeKind::Template { strings, values }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AnimatedValue;
    use crate::value::Value;

    #[test]
    fn arithmetic_reads_through_parents() {
        let a = AnimatedValue::new(2.0);
        let b = AnimatedValue::new(3.0);
        let sum = add(&a, &b).unwrap();
        let product = multiply(&a, 10.0).unwrap();
        assert_eq!(sum.value(), Value::Float(5.0));
        assert_eq!(product.value(), Value::Float(20.0));

        a.set_value(4.0);
        assert_eq!(sum.value(), Value::Float(7.0));
        assert_eq!(product.value(), Value::Float(40.0));
    }

    #[test]
    fn modulo_wraps_negative_inputs() {
        let a = AnimatedValue::new(-1.0);
        let wrapped = modulo(&a, 360.0).unwrap();
        assert_eq!(wrapped.value(), Value::Float(359.0));
        a.set_value(725.0);
        assert_eq!(wrapped.value(), Value::Float(5.0));
    }

    #[test]
    fn text_parents_are_rejected() {
        let a = AnimatedValue::new(0.0);
        let colors = a
            .interpolate(&InterpolationConfig::new(vec![0.0, 1.0], vec!["red", "blue"]))
            .unwrap();
        assert!(matches!(
            add(&colors, 1.0),
            Err(AnimatedError::NonNumericInput { .. })
        ));
        assert!(matches!(
            colors.interpolate(&InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 1.0])),
            Err(AnimatedError::NonNumericInput { .. })
        ));
    }

    #[test]
    fn template_arity_is_checked() {
        let err = template(vec!["a".into()], vec![Entry::from(1.0)]).unwrap_err();
        assert_eq!(
            err,
            AnimatedError::TemplateArity {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn derived_nodes_stay_dormant_until_consumed() {
        let a = AnimatedValue::new(1.0);
        let sum = add(&a, 1.0).unwrap();
        assert!(!sum.is_attached());
        assert_eq!(a.node().child_count(), 0);
    }
}
