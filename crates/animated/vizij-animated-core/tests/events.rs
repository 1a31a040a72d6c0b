use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use vizij_animated::{event, AnimatedError, AnimatedValue, AnimatedValueXY, EventMapping, XY};

#[test]
fn nested_mapping_sets_every_reached_value() {
    let pan = AnimatedValueXY::new(XY::default());
    let scale = AnimatedValue::new(1.0);
    let handler = event(
        vec![
            Some(EventMapping::object([(
                "native_event",
                EventMapping::object([
                    ("dx", EventMapping::from(&pan.x)),
                    ("dy", EventMapping::from(&pan.y)),
                ]),
            )])),
            Some(EventMapping::from(&scale)),
        ],
        None,
    );

    handler
        .handle(&[
            json!({ "native_event": { "dx": 12.5, "dy": -3, "extra": "ignored" } }),
            json!(2),
        ])
        .unwrap();

    assert_eq!(pan.value(), XY::new(12.5, -3.0));
    assert_eq!(scale.value(), 2.0);
}

#[test]
fn array_events_are_indexed_by_key() {
    let x = AnimatedValue::new(0.0);
    let second = AnimatedValue::new(0.0);
    let touch = |value: &AnimatedValue| EventMapping::object([("page_x", value.into())]);
    let touches = EventMapping::object([("0", touch(&x)), ("1", touch(&second))]);
    let handler = event(vec![Some(EventMapping::object([("touches", touches)]))], None);

    let both = json!({ "touches": [{ "page_x": 5 }, { "page_x": -2.5 }] });
    handler.handle(&[both]).unwrap();
    assert_eq!(x.value(), 5.0);
    assert_eq!(second.value(), -2.5);

    let one = json!({ "touches": [{ "page_x": 7 }] });
    let err = handler.handle(&[one]).unwrap_err();
    assert!(matches!(err, AnimatedError::EventMapping { ref key, .. } if key == "1"));
    assert_eq!(x.value(), 7.0);
}

#[test]
fn listener_receives_raw_arguments() {
    let x = AnimatedValue::new(0.0);
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    let handler = event(
        vec![None, Some(EventMapping::from(&x))],
        Some(Rc::new(move |args: &[serde_json::Value]| {
            sink.borrow_mut().extend_from_slice(args)
        })),
    );

    handler.handle(&[json!("tap"), json!(7)]).unwrap();

    assert_eq!(x.value(), 7.0);
    assert_eq!(*received.borrow(), vec![json!("tap"), json!(7)]);
}

#[test]
fn shape_mismatches_are_errors() {
    let x = AnimatedValue::new(0.0);
    let handler = event(vec![Some(EventMapping::from(&x))], None);

    let err = handler.handle(&[json!({ "x": 1 })]).unwrap_err();
    assert!(matches!(err, AnimatedError::EventMapping { ref key, .. } if key == "arg0"));
    assert!(handler.handle(&[json!("1")]).is_err());
    assert!(handler.handle(&[]).is_err());
    assert_eq!(x.value(), 0.0);
}

#[test]
fn listener_is_skipped_when_mapping_fails() {
    let x = AnimatedValue::new(0.0);
    let calls = Rc::new(RefCell::new(0));
    let count = calls.clone();
    let handler = event(
        vec![Some(EventMapping::object([("x", EventMapping::from(&x))]))],
        Some(Rc::new(move |_: &[serde_json::Value]| {
            *count.borrow_mut() += 1
        })),
    );

    assert!(handler.handle(&[json!(3)]).is_err());
    assert_eq!(*calls.borrow(), 0);
    handler.handle(&[json!({ "x": 3 })]).unwrap();
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(x.value(), 3.0);
}

#[test]
fn events_stop_running_drivers() {
    use vizij_animated::{timing, FrameLoop, TimingConfig};

    let frames = FrameLoop::new();
    let x = AnimatedValue::new(0.0);
    let motion = timing(&x, TimingConfig::to(100.0), frames.runtime());
    vizij_animated::start(&motion, None);
    frames.step(16.0);
    assert!(x.is_animating());

    let handler = event(vec![Some(EventMapping::from(&x))], None);
    handler.handle(&[json!(-1)]).unwrap();
    assert!(!x.is_animating());
    assert_eq!(x.value(), -1.0);
}
