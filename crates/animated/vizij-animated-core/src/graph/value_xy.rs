use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{AnimatedValue, Entry, Node, NodeInner};
use crate::ids::{next_listener_id, ListenerId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

impl XY {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two root values animated as a vector.
#[derive(Clone, Debug)]
pub struct AnimatedValueXY {
    pub x: AnimatedValue,
    pub y: AnimatedValue,
    /// Joint id -> per-axis ids.
    listeners: Rc<RefCell<HashMap<ListenerId, (ListenerId, ListenerId)>>>,
}

impl AnimatedValueXY {
    pub fn new(value: XY) -> Self {
        Self::from_values(AnimatedValue::new(value.x), AnimatedValue::new(value.y))
    }

    pub fn from_values(x: AnimatedValue, y: AnimatedValue) -> Self {
        Self {
            x,
            y,
            listeners: Rc::default(),
        }
    }

    pub fn value(&self) -> XY {
        XY::new(self.x.value(), self.y.value())
    }

    pub fn set_value(&self, value: XY) {
        self.x.set_value(value.x);
        self.y.set_value(value.y);
    }

    pub fn set_offset(&self, offset: XY) {
        self.x.set_offset(offset.x);
        self.y.set_offset(offset.y);
    }

    pub fn flatten_offset(&self) {
        self.x.flatten_offset();
        self.y.flatten_offset();
    }

    pub fn stop_animation(&self) {
        self.x.stop_animation();
        self.y.stop_animation();
    }

    pub fn stop_animation_with(&self, callback: impl FnOnce(XY)) {
        self.stop_animation();
        callback(self.value());
    }

    /// Register `callback` on both axes; it receives the full vector whenever
    /// either axis commits.
    pub fn add_listener(&self, callback: impl Fn(XY) + 'static) -> ListenerId {
        let callback = Rc::new(callback);
        let x_ref = Rc::downgrade(&self.x.node().0);
        let y_ref = Rc::downgrade(&self.y.node().0);

        let cb = callback.clone();
        let other = y_ref.clone();
        let x_id = self.x.add_listener(move |x| {
            cb(XY::new(x.to_float(), read(&other)));
        });
        let other = x_ref;
        let y_id = self.y.add_listener(move |y| {
            callback(XY::new(read(&other), y.to_float()));
        });

        let id = next_listener_id();
        self.listeners.borrow_mut().insert(id, (x_id, y_id));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        let ids = self.listeners.borrow_mut().remove(&id);
        if let Some((x_id, y_id)) = ids {
            self.x.remove_listener(x_id);
            self.y.remove_listener(y_id);
        }
    }

    pub fn remove_all_listeners(&self) {
        let ids: Vec<_> = self.listeners.borrow_mut().drain().collect();
        for (_, (x_id, y_id)) in ids {
            self.x.remove_listener(x_id);
            self.y.remove_listener(y_id);
        }
    }

    /// Props entries positioning an element at this vector.
    pub fn layout(&self) -> IndexMap<String, Entry> {
        IndexMap::from([
            ("left".to_string(), Entry::from(&self.x)),
            ("top".to_string(), Entry::from(&self.y)),
        ])
    }

    /// Props entries for a translate transform.
    pub fn translate_transform(&self) -> IndexMap<String, Entry> {
        IndexMap::from([
            ("translate_x".to_string(), Entry::from(&self.x)),
            ("translate_y".to_string(), Entry::from(&self.y)),
        ])
    }
}

fn read(axis: &Weak<NodeInner>) -> f64 {
    axis.upgrade()
        .map(|inner| Node(inner).value().to_float())
        .unwrap_or(f64::NAN)
}
