//! Root value node: the only mutable source in the graph.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::debug;

use super::tracking::{self, AnimationFactory, SessionEndCallback};
use super::{flush, Node, NodeKind};
use crate::animation::{Animation, EndCallback, UpdateCallback};
use crate::error::Result;
use crate::ids::ListenerId;
use crate::interpolation::InterpolationConfig;
use crate::value::Value;

pub(crate) struct ValueState {
    value: Cell<f64>,
    offset: Cell<f64>,
    animation: RefCell<Option<Rc<dyn Animation>>>,
    tracking: RefCell<Option<Node>>,
}

impl ValueState {
    pub(crate) fn current(&self) -> f64 {
        self.value.get() + self.offset.get()
    }

    fn stop_tracking(&self) {
        let tracking = self.tracking.borrow_mut().take();
        if let Some(tracking) = tracking {
            tracking.detach();
        }
    }

    fn stop_driver(&self) {
        let animation = self.animation.borrow_mut().take();
        if let Some(animation) = animation {
            animation.stop();
        }
    }

    /// Stop tracking and any running driver.
    pub(crate) fn halt(&self) {
        self.stop_tracking();
        self.stop_driver();
    }

    /// Forget the active driver if it is still `ended`.
    fn clear_driver_if(&self, ended: *const ()) {
        let cleared = {
            let mut slot = self.animation.borrow_mut();
            match slot.as_ref() {
                Some(active) if Rc::as_ptr(active) as *const () == ended => slot.take(),
                _ => None,
            }
        };
        drop(cleared);
    }
}

/// Handle to a root value node.
///
/// The resolved value is `value + offset`. Offsets are never broadcast on their
/// own; they show up at the next read or commit.
#[derive(Clone)]
pub struct AnimatedValue {
    node: Node,
    state: Rc<ValueState>,
}

impl fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedValue")
            .field("value", &self.state.value.get())
            .field("offset", &self.state.offset.get())
            .field("animating", &self.is_animating())
            .field("tracking", &self.is_tracking())
            .finish()
    }
}

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        let state = Rc::new(ValueState {
            value: Cell::new(value),
            offset: Cell::new(0.0),
            animation: RefCell::new(None),
            tracking: RefCell::new(None),
        });
        let node = Node::new(NodeKind::Value(state.clone()));
        Self { node, state }
    }

    pub(crate) fn from_node(node: &Node) -> Option<Self> {
        match node.kind() {
            NodeKind::Value(state) => Some(Self {
                node: node.clone(),
                state: state.clone(),
            }),
            _ => None,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    /// `value + offset`.
    pub fn value(&self) -> f64 {
        self.state.current()
    }

    pub fn offset(&self) -> f64 {
        self.state.offset.get()
    }

    pub fn is_animating(&self) -> bool {
        self.state.animation.borrow().is_some()
    }

    pub fn is_tracking(&self) -> bool {
        self.state.tracking.borrow().is_some()
    }

    /// Stop any driver and tracking, then commit `value`.
    pub fn set_value(&self, value: f64) {
        self.state.halt();
        self.update_value(value);
    }

    pub fn set_offset(&self, offset: f64) {
        self.state.offset.set(offset);
    }

    /// Fold the offset into the base value; the resolved value does not change.
    pub fn flatten_offset(&self) {
        self.state
            .value
            .set(self.state.value.get() + self.state.offset.get());
        self.state.offset.set(0.0);
    }

    pub fn add_listener(&self, callback: impl Fn(&Value) + 'static) -> ListenerId {
        self.node.add_listener(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.node.remove_listener(id);
    }

    pub fn remove_all_listeners(&self) {
        self.node.remove_all_listeners();
    }

    pub fn interpolate(&self, config: &InterpolationConfig) -> Result<Node> {
        self.node.interpolate(config)
    }

    /// Stop tracking and the active driver.
    pub fn stop_animation(&self) {
        self.state.halt();
    }

    /// Like [`AnimatedValue::stop_animation`], then report the settled value.
    pub fn stop_animation_with(&self, callback: impl FnOnce(f64)) {
        self.state.halt();
        callback(self.value());
    }

    /// Run `animation` on this value, replacing the active driver.
    pub fn animate(&self, animation: Rc<dyn Animation>, on_end: Option<EndCallback>) {
        let previous = self.state.animation.borrow_mut().take();
        let runtime = animation.runtime().clone();
        let handle = animation
            .is_interaction()
            .then(|| runtime.create_interaction_handle());
        if let Some(handle) = handle {
            debug!("acquired interaction handle {handle:?}");
        }

        if let Some(previous) = &previous {
            previous.stop();
        }
        *self.state.animation.borrow_mut() = Some(animation.clone());

        let weak_node = Rc::downgrade(&self.node.0);
        let on_update: UpdateCallback = Rc::new(move |value| {
            if let Some(root) = weak_node
                .upgrade()
                .and_then(|inner| Self::from_node(&Node(inner)))
            {
                root.update_value(value);
            }
        });

        let weak_state = Rc::downgrade(&self.state);
        let token = Rc::as_ptr(&animation) as *const ();
        let on_end_wrapped: EndCallback = Box::new(move |result| {
            if let Some(state) = weak_state.upgrade() {
                state.clear_driver_if(token);
            }
            if let Some(handle) = handle {
                runtime.clear_interaction_handle(handle);
                debug!("released interaction handle {handle:?}");
            }
            if let Some(on_end) = on_end {
                on_end(result);
            }
        });

        animation.start(
            self.state.value.get(),
            on_update,
            Some(on_end_wrapped),
            previous,
        );
    }

    /// Chase `target`: every commit on it restarts a driver built by `factory`
    /// aimed at the target's new value.
    pub fn track(
        &self,
        target: &Node,
        factory: AnimationFactory,
        on_end: Option<SessionEndCallback>,
    ) {
        self.state.stop_tracking();
        let relation = tracking::tracking(self, target.clone(), factory, on_end);
        *self.state.tracking.borrow_mut() = Some(relation);
    }

    pub fn stop_tracking(&self) {
        self.state.stop_tracking();
    }

    /// Commit a new base value: recompute reachable leaves, then notify listeners.
    pub(crate) fn update_value(&self, value: f64) {
        self.state.value.set(value);
        flush(&self.node);
        self.node.notify_listeners();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn offset_is_read_but_not_broadcast() {
        let value = AnimatedValue::new(10.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        value.add_listener(move |v| sink.borrow_mut().push(v.to_float()));

        value.set_offset(5.0);
        assert!(seen.borrow().is_empty());
        assert_eq!(value.value(), 15.0);

        value.flatten_offset();
        assert_eq!(value.value(), 15.0);
        assert_eq!(value.offset(), 0.0);
        assert!(seen.borrow().is_empty());

        value.set_value(1.0);
        assert_eq!(*seen.borrow(), vec![1.0]);
    }

    #[test]
    fn removed_listeners_stop_firing() {
        let value = AnimatedValue::new(0.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = value.add_listener(move |_| h.set(h.get() + 1));
        value.set_value(1.0);
        value.remove_listener(id);
        value.remove_listener(id);
        value.set_value(2.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn stop_animation_reports_settled_value() {
        let value = AnimatedValue::new(3.0);
        value.set_offset(1.0);
        let settled = Rc::new(Cell::new(f64::NAN));
        let s = settled.clone();
        value.stop_animation_with(move |v| s.set(v));
        assert_eq!(settled.get(), 4.0);
    }
}
