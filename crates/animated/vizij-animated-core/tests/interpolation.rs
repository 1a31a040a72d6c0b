use approx::assert_abs_diff_eq;
use vizij_animated::{
    AnimatedError, AnimatedValue, Easing, Extrapolate, Interpolation, InterpolationConfig, Value,
};

fn numeric(config: InterpolationConfig) -> impl Fn(f64) -> f64 {
    let interpolation = Interpolation::create(&config).expect("valid numeric config");
    move |x| interpolation.evaluate(x).to_float()
}

fn text(input: Vec<f64>, output: Vec<&str>) -> impl Fn(f64) -> String {
    let interpolation = Interpolation::create(&InterpolationConfig::new(input, output))
        .expect("valid string config");
    move |x| match interpolation.evaluate(x) {
        Value::Text(s) => s,
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn identity_mapping_by_default() {
    let f = numeric(InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 1.0]));
    assert_eq!(f(0.0), 0.0);
    assert_eq!(f(0.5), 0.5);
    assert_eq!(f(0.8), 0.8);
    assert_eq!(f(1.0), 1.0);
}

#[test]
fn maps_onto_output_range() {
    let f = numeric(InterpolationConfig::new(vec![0.0, 1.0], vec![100.0, 200.0]));
    assert_eq!(f(0.0), 100.0);
    assert_eq!(f(0.5), 150.0);
    assert_eq!(f(0.8), 180.0);
    assert_eq!(f(1.0), 200.0);
}

#[test]
fn maps_from_input_range() {
    let f = numeric(InterpolationConfig::new(vec![100.0, 200.0], vec![0.0, 1.0]));
    assert_eq!(f(100.0), 0.0);
    assert_eq!(f(150.0), 0.5);
    assert_eq!(f(180.0), 0.8);
    assert_eq!(f(200.0), 1.0);
}

#[test]
fn input_range_must_not_decrease() {
    let err = Interpolation::create(&InterpolationConfig::new(
        vec![0.0, 2.0, 1.0],
        vec![0.0, 1.0, 2.0],
    ))
    .unwrap_err();
    assert!(matches!(err, AnimatedError::NonMonotonicInputRange { .. }));

    // Only the input side has to be monotonic.
    assert!(Interpolation::create(&InterpolationConfig::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0, 3.0, 1.0],
    ))
    .is_ok());
}

#[test]
fn collapsed_input_segment() {
    let f = numeric(
        InterpolationConfig::new(vec![0.0, 10.0, 10.0], vec![1.0, 2.0, 3.0])
            .with_extrapolate(Extrapolate::Extend),
    );
    assert_eq!(f(0.0), 1.0);
    assert_eq!(f(5.0), 1.5);
    assert_eq!(f(10.0), 2.0);
    assert_eq!(f(10.1), 3.0);
    assert_eq!(f(15.0), 3.0);
}

#[test]
fn collapsed_output_segment() {
    let f = numeric(
        InterpolationConfig::new(vec![1.0, 2.0, 3.0], vec![0.0, 10.0, 10.0])
            .with_extrapolate(Extrapolate::Extend),
    );
    assert_eq!(f(0.0), -10.0);
    assert_eq!(f(1.5), 5.0);
    assert_eq!(f(2.0), 10.0);
    assert_eq!(f(2.5), 10.0);
    assert_eq!(f(3.0), 10.0);
    assert_eq!(f(4.0), 10.0);
}

#[test]
fn easing_applies_to_normalized_input() {
    let f = numeric(
        InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 1.0]).with_easing(Easing::Quad),
    );
    assert_eq!(f(0.0), 0.0);
    assert_eq!(f(0.5), 0.25);
    assert_eq!(f(0.9), 0.81);
    assert_eq!(f(1.0), 1.0);
}

#[test]
fn extrapolation_policies() {
    let base =
        || InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 1.0]).with_easing(Easing::Quad);

    let extend = numeric(base().with_extrapolate(Extrapolate::Extend));
    assert_eq!(extend(-2.0), 4.0);
    assert_eq!(extend(2.0), 4.0);

    let clamp = numeric(base().with_extrapolate(Extrapolate::Clamp));
    assert_eq!(clamp(-2.0), 0.0);
    assert_eq!(clamp(2.0), 1.0);

    let identity = numeric(base().with_extrapolate(Extrapolate::Identity));
    assert_eq!(identity(-2.0), -2.0);
    assert_eq!(identity(2.0), 2.0);
}

#[test]
fn clamp_stays_inside_output_bounds() {
    let f = numeric(
        InterpolationConfig::new(vec![0.0, 1.0, 2.0], vec![0.2, 1.0, 0.2])
            .with_extrapolate(Extrapolate::Clamp),
    );
    assert_abs_diff_eq!(f(5.0), 0.2, epsilon = 1e-9);
    for i in -40..=40 {
        let v = f(i as f64 * 0.125);
        assert!(
            v >= 0.2 - 1e-9 && v <= 1.0 + 1e-9,
            "f({}) = {v}",
            i as f64 * 0.125
        );
    }
}

#[test]
fn keyframes_extend_past_both_ends() {
    let f = numeric(InterpolationConfig::new(
        vec![0.0, 10.0, 100.0, 1000.0],
        vec![0.0, 5.0, 50.0, 500.0],
    ));
    assert_eq!(f(-5.0), -2.5);
    assert_eq!(f(0.0), 0.0);
    assert_eq!(f(5.0), 2.5);
    assert_eq!(f(10.0), 5.0);
    assert_eq!(f(50.0), 25.0);
    assert_eq!(f(100.0), 50.0);
    assert_eq!(f(500.0), 250.0);
    assert_eq!(f(1000.0), 500.0);
    assert_eq!(f(2000.0), 1000.0);
}

#[test]
fn samples_map_exactly() {
    let input = vec![-3.0, 0.0, 0.5, 7.25, 40.0];
    let output = vec![10.0, -2.0, 3.5, 3.5, 1e6];
    let f = numeric(InterpolationConfig::new(input.clone(), output.clone()));
    for (x, y) in input.iter().zip(&output) {
        assert_eq!(f(*x), *y);
    }
}

#[test]
fn doubly_infinite_input_is_rejected() {
    let err = Interpolation::create(&InterpolationConfig::new(
        vec![f64::NEG_INFINITY, f64::INFINITY],
        vec![0.0, 1.0],
    ))
    .unwrap_err();
    assert!(matches!(err, AnimatedError::UnboundedRange { .. }));

    assert!(Interpolation::create(&InterpolationConfig::new(
        vec![f64::NEG_INFINITY, 0.0, f64::INFINITY],
        vec![1.0, 2.0, 3.0],
    ))
    .is_ok());
}

#[test]
fn negative_infinite_bounds() {
    let f = numeric(
        InterpolationConfig::new(vec![f64::NEG_INFINITY, 0.0], vec![f64::NEG_INFINITY, 0.0])
            .with_easing(Easing::Quad)
            .with_extrapolate(Extrapolate::Identity),
    );
    assert_eq!(f(f64::NEG_INFINITY), f64::NEG_INFINITY);
    assert_abs_diff_eq!(f(-100.0), -10000.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(-10.0), -100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(0.0), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(1.0), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(100.0), 100.0, epsilon = 1e-6);
}

#[test]
fn positive_infinite_bounds() {
    let f = numeric(
        InterpolationConfig::new(vec![5.0, f64::INFINITY], vec![5.0, f64::INFINITY])
            .with_easing(Easing::Quad)
            .with_extrapolate(Extrapolate::Identity),
    );
    assert_abs_diff_eq!(f(-100.0), -100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(-10.0), -10.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(0.0), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(5.0), 5.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(6.0), 6.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(10.0), 30.0, epsilon = 1e-6);
    assert_abs_diff_eq!(f(100.0), 5.0 + 95.0 * 95.0, epsilon = 1e-6);
    assert_eq!(f(f64::INFINITY), f64::INFINITY);
}

#[test]
fn rgba_strings() {
    let f = text(
        vec![0.0, 1.0],
        vec!["rgba(0, 100, 200, 0)", "rgba(50, 150, 250, 0.4)"],
    );
    assert_eq!(f(0.0), "rgba(0, 100, 200, 0)");
    assert_eq!(f(0.5), "rgba(25, 125, 225, 0.2)");
    assert_eq!(f(1.0), "rgba(50, 150, 250, 0.4)");
}

#[test]
fn short_hex_strings() {
    let f = text(vec![0.0, 1.0], vec!["#024", "#9BF"]);
    assert_eq!(f(0.0), "rgba(0, 34, 68, 1)");
    assert_eq!(f(0.5), "rgba(76.5, 110.5, 161.5, 1)");
    assert_eq!(f(1.0), "rgba(153, 187, 255, 1)");
}

#[test]
fn long_hex_strings() {
    let f = text(vec![0.0, 1.0], vec!["#FF9500", "#87FC70"]);
    assert_eq!(f(0.0), "rgba(255, 149, 0, 1)");
    assert_eq!(f(0.5), "rgba(195, 200.5, 56, 1)");
    assert_eq!(f(1.0), "rgba(135, 252, 112, 1)");
}

#[test]
fn mixed_hex_and_rgba_strings() {
    let f = text(vec![0.0, 1.0], vec!["rgba(100, 120, 140, .4)", "#87FC70"]);
    assert_eq!(f(0.0), "rgba(100, 120, 140, 0.4)");
    assert_eq!(f(0.5), "rgba(117.5, 186, 126, 0.7)");
    assert_eq!(f(1.0), "rgba(135, 252, 112, 1)");
}

#[test]
fn negative_and_decimal_units() {
    let f = text(vec![0.0, 1.0], vec!["-100.5deg", "100deg"]);
    assert_eq!(f(0.0), "-100.5deg");
    assert_eq!(f(0.5), "-0.25deg");
    assert_eq!(f(1.0), "100deg");
}

#[test]
fn mixed_color_syntaxes_over_keyframes() {
    let f = text(
        vec![0.0, 1.0, 2.0],
        vec!["rgba(0, 100, 200, 0)", "rgb(50, 150, 250)", "red"],
    );
    assert_eq!(f(0.0), "rgba(0, 100, 200, 0)");
    assert_eq!(f(0.5), "rgba(25, 125, 225, 0.5)");
    assert_eq!(f(1.5), "rgba(152.5, 75, 125, 1)");
    assert_eq!(f(2.0), "rgba(255, 0, 0, 1)");
}

#[test]
fn differing_string_shapes_are_rejected() {
    let err = Interpolation::create(&InterpolationConfig::new(
        vec![0.0, 1.0],
        vec!["20deg", "30rad"],
    ))
    .unwrap_err();
    assert!(matches!(err, AnimatedError::PatternMismatch { .. }));
}

#[test]
fn chaining_onto_a_string_output_fails() {
    let root = AnimatedValue::new(0.0);
    let angle = root
        .interpolate(&InterpolationConfig::new(vec![0.0, 1.0], vec!["0rad", "45rad"]))
        .expect("valid string config");
    let err = angle
        .interpolate(&InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 1.0]))
        .unwrap_err();
    assert!(matches!(err, AnimatedError::NonNumericInput { .. }));
}
