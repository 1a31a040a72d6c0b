use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::ids::{next_listener_id, ListenerId};
use crate::value::Value;

/// Value-change observer. Receives the node's resolved value after a commit.
pub type ListenerCallback = Rc<dyn Fn(&Value)>;

/// Registry of value-change listeners keyed by id.
#[derive(Default)]
pub(crate) struct Listeners {
    map: RefCell<HashMap<ListenerId, ListenerCallback>>,
}

impl Listeners {
    pub(crate) fn add(&self, callback: ListenerCallback) -> ListenerId {
        let id = next_listener_id();
        self.map.borrow_mut().insert(id, callback);
        id
    }

    /// Unknown ids are ignored.
    pub(crate) fn remove(&self, id: ListenerId) {
        let removed = self.map.borrow_mut().remove(&id);
        drop(removed);
    }

    pub(crate) fn clear(&self) {
        let drained = std::mem::take(&mut *self.map.borrow_mut());
        drop(drained);
    }

    pub(crate) fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    /// Call every registered listener with `value`. Listeners may add or remove
    /// registrations while being notified; changes apply from the next notify.
    pub(crate) fn notify(&self, value: &Value) {
        let snapshot: Vec<ListenerCallback> = self.map.borrow().values().cloned().collect();
        for listener in snapshot {
            listener(value);
        }
    }
}
