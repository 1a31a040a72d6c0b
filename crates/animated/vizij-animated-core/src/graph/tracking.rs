use std::rc::{Rc, Weak};

use log::debug;

use super::{AnimatedValue, Node, NodeInner, NodeKind};
use crate::animation::{Animation, EndCallback, EndResult};

/// Builds a fresh driver aimed at the given target value.
pub type AnimationFactory = Rc<dyn Fn(f64) -> Rc<dyn Animation>>;

/// End callback shared by every session of a tracking relation.
pub type SessionEndCallback = Rc<dyn Fn(EndResult)>;

/// Leaf hung off a target node; each commit on the target restarts a driver on
/// the tracked value.
pub(crate) struct TrackingState {
    value: Weak<NodeInner>,
    pub(crate) parent: Node,
    factory: AnimationFactory,
    on_end: Option<SessionEndCallback>,
}

pub(crate) fn tracking(
    value: &AnimatedValue,
    target: Node,
    factory: AnimationFactory,
    on_end: Option<SessionEndCallback>,
) -> Node {
    let node = Node::new(NodeKind::Tracking(TrackingState {
        value: Rc::downgrade(&value.node().0),
        parent: target,
        factory,
        on_end,
    }));
    node.attach();
    node
}

impl TrackingState {
    pub(crate) fn update(&self) {
        let Some(value) = self
            .value
            .upgrade()
            .and_then(|inner| AnimatedValue::from_node(&Node(inner)))
        else {
            return;
        };
        let to_value = self.parent.value().to_float();
        debug!("tracking target moved to {to_value}; restarting driver");
        let animation = (self.factory)(to_value);
        let on_end: Option<EndCallback> = match &self.on_end {
            Some(callback) => {
                let callback = callback.clone();
                Some(Box::new(move |result| callback(result)))
            }
            None => None,
        };
        value.animate(animation, on_end);
    }
}
