use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Entry, Node, NodeKind};
use crate::value::Value;

pub(crate) struct PropsState {
    pub(crate) entries: IndexMap<String, Entry>,
    pub(crate) callback: Rc<dyn Fn()>,
}

/// Update sink over a named set of entries.
///
/// The host callback runs once per commit that reaches any animated entry;
/// applying the values to a presentation target is up to the host.
#[derive(Clone)]
pub struct AnimatedProps {
    node: Node,
}

impl fmt::Debug for AnimatedProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnimatedProps").field(&self.node).finish()
    }
}

impl AnimatedProps {
    /// Build the leaf and register it with every animated entry.
    pub fn new(entries: IndexMap<String, Entry>, callback: impl Fn() + 'static) -> Self {
        let node = Node::new(NodeKind::Props(PropsState {
            entries,
            callback: Rc::new(callback),
        }));
        node.attach();
        Self { node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Every entry, resolved.
    pub fn value(&self) -> Value {
        self.node.value()
    }

    /// Animated entries only.
    pub fn animated_value(&self) -> Value {
        self.node.animated_value()
    }

    pub fn update(&self) {
        self.node.update();
    }

    /// Unregister from every animated entry.
    pub fn detach(&self) {
        self.node.detach();
    }
}
