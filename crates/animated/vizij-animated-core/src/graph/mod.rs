//! Animated value graph.
//!
//! Root values are the only mutable sources. Derived nodes (interpolations,
//! arithmetic, templates) compute lazily from their parents; leaves (props and
//! tracking relations) expose an `update` hook that propagation calls.
//!
//! Ownership runs child to parent: a derived node keeps its parents alive with
//! strong references while parents only keep weak references to their children.
//! A node is *live* while it has at least one child, which is when it registers
//! itself with its own parents.

mod combinators;
mod listeners;
mod props;
mod tracking;
mod value_node;
mod value_xy;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use hashbrown::HashSet;
use indexmap::IndexMap;
use log::{trace, warn};

use crate::error::Result;
use crate::ids::ListenerId;
use crate::interpolation::{Interpolation, InterpolationConfig};
use crate::value::{Value, ValueKind};

pub use combinators::{add, interpolate, modulo, multiply, template};
pub use listeners::ListenerCallback;
pub use props::AnimatedProps;
pub use tracking::{AnimationFactory, SessionEndCallback};
pub use value_node::AnimatedValue;
pub use value_xy::{AnimatedValueXY, XY};

use listeners::Listeners;
use props::PropsState;
use tracking::TrackingState;
use value_node::ValueState;

/// An input slot of a template or props leaf: either a graph node or a fixed value.
#[derive(Clone, Debug)]
pub enum Entry {
    Animated(Node),
    Static(Value),
}

impl Entry {
    fn resolve(&self) -> Value {
        match self {
            Entry::Animated(node) => node.value(),
            Entry::Static(value) => value.clone(),
        }
    }

    fn node(&self) -> Option<&Node> {
        match self {
            Entry::Animated(node) => Some(node),
            Entry::Static(_) => None,
        }
    }
}

impl From<Node> for Entry {
    fn from(node: Node) -> Self {
        Entry::Animated(node)
    }
}

impl From<&Node> for Entry {
    fn from(node: &Node) -> Self {
        Entry::Animated(node.clone())
    }
}

impl From<&AnimatedValue> for Entry {
    fn from(value: &AnimatedValue) -> Self {
        Entry::Animated(value.node().clone())
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Static(value)
    }
}

impl From<f64> for Entry {
    fn from(value: f64) -> Self {
        Entry::Static(Value::Float(value))
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Entry::Static(Value::Text(value.to_string()))
    }
}

pub(crate) enum NodeKind {
    Value(Rc<ValueState>),
    Interpolation {
        parent: Node,
        interpolation: Interpolation,
    },
    Addition {
        a: Node,
        b: Node,
    },
    Multiplication {
        a: Node,
        b: Node,
    },
    Modulo {
        a: Node,
        modulus: f64,
    },
    Template {
        strings: Vec<String>,
        values: Vec<Entry>,
    },
    Tracking(TrackingState),
    Props(PropsState),
}

impl NodeKind {
    fn name(&self) -> &'static str {
        match self {
            NodeKind::Value(_) => "value",
            NodeKind::Interpolation { .. } => "interpolation",
            NodeKind::Addition { .. } => "addition",
            NodeKind::Multiplication { .. } => "multiplication",
            NodeKind::Modulo { .. } => "modulo",
            NodeKind::Template { .. } => "template",
            NodeKind::Tracking(_) => "tracking",
            NodeKind::Props(_) => "props",
        }
    }
}

pub(crate) struct NodeInner {
    children: RefCell<Vec<Weak<NodeInner>>>,
    /// Registered with parents (derived nodes) or marked live (roots, leaves).
    attached: Cell<bool>,
    listeners: Listeners,
    /// Listener ids this node holds on its parents, set on first `add_listener`.
    parent_subscriptions: RefCell<Option<Vec<(Node, ListenerId)>>>,
    kind: NodeKind,
}

/// Shared handle to a graph node. Cloning is cheap and keeps the node alive.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeInner>);

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.0.kind.name())
            .field("children", &self.0.children.borrow().len())
            .field("attached", &self.0.attached.get())
            .finish()
    }
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Node(Rc::new(NodeInner {
            children: RefCell::new(Vec::new()),
            attached: Cell::new(false),
            listeners: Listeners::default(),
            parent_subscriptions: RefCell::new(None),
            kind,
        }))
    }

    pub(crate) fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Resolve the node's current value, pulling through its parents.
    pub fn value(&self) -> Value {
        match &self.0.kind {
            NodeKind::Value(state) => Value::Float(state.current()),
            NodeKind::Interpolation {
                parent,
                interpolation,
            } => interpolation.evaluate(parent.value().to_float()),
            NodeKind::Addition { a, b } => {
                Value::Float(a.value().to_float() + b.value().to_float())
            }
            NodeKind::Multiplication { a, b } => {
                Value::Float(a.value().to_float() * b.value().to_float())
            }
            NodeKind::Modulo { a, modulus } => {
                let v = a.value().to_float();
                Value::Float(((v % modulus) + modulus) % modulus)
            }
            NodeKind::Template { strings, values } => {
                let mut out = strings.first().cloned().unwrap_or_default();
                for (value, tail) in values.iter().zip(strings.iter().skip(1)) {
                    out.push_str(&value.resolve().to_string());
                    out.push_str(tail);
                }
                Value::Text(out)
            }
            NodeKind::Tracking(tracking) => tracking.parent.value(),
            NodeKind::Props(props) => Value::Record(
                props
                    .entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), entry.resolve()))
                    .collect(),
            ),
        }
    }

    /// Like [`Node::value`], but props leaves omit their static entries.
    pub fn animated_value(&self) -> Value {
        match &self.0.kind {
            NodeKind::Tracking(tracking) => tracking.parent.animated_value(),
            NodeKind::Props(props) => {
                let map: IndexMap<String, Value> = props
                    .entries
                    .iter()
                    .filter_map(|(key, entry)| {
                        entry
                            .node()
                            .map(|node| (key.clone(), node.animated_value()))
                    })
                    .collect();
                Value::Record(map)
            }
            _ => self.value(),
        }
    }

    /// What [`Node::value`] produces, known without evaluating.
    pub fn output_kind(&self) -> ValueKind {
        match &self.0.kind {
            NodeKind::Value(_)
            | NodeKind::Addition { .. }
            | NodeKind::Multiplication { .. }
            | NodeKind::Modulo { .. } => ValueKind::Float,
            NodeKind::Interpolation { interpolation, .. } => {
                if interpolation.produces_text() {
                    ValueKind::Text
                } else {
                    ValueKind::Float
                }
            }
            NodeKind::Template { .. } => ValueKind::Text,
            NodeKind::Tracking(tracking) => tracking.parent.output_kind(),
            NodeKind::Props(_) => ValueKind::Record,
        }
    }

    /// Register `child` as a consumer. Registrations are not deduplicated; the
    /// first one makes this node live.
    pub fn add_child(&self, child: &Node) {
        let first = {
            let mut children = self.0.children.borrow_mut();
            children.push(Rc::downgrade(&child.0));
            children.len() == 1
        };
        if first {
            self.attach();
        }
    }

    /// Remove one registration of `child`. Removing the last one makes this node
    /// dormant. Unknown children are ignored with a warning.
    pub fn remove_child(&self, child: &Node) {
        self.0.remove_child_ptr(Rc::as_ptr(&child.0));
    }

    /// Live children in registration order, duplicates included.
    pub fn children(&self) -> Vec<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .filter_map(|weak| weak.upgrade().map(Node))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Observe value changes. Derived nodes subscribe to their parents on the
    /// first registration and report their own resolved value.
    pub fn add_listener(&self, callback: impl Fn(&Value) + 'static) -> ListenerId {
        self.add_listener_rc(Rc::new(callback))
    }

    pub(crate) fn add_listener_rc(&self, callback: ListenerCallback) -> ListenerId {
        if !matches!(self.0.kind, NodeKind::Value(_)) {
            self.subscribe_to_parents();
        }
        self.0.listeners.add(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.0.listeners.remove(id);
    }

    pub fn remove_all_listeners(&self) {
        self.0.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.len()
    }

    /// Map this node's numeric output through an interpolation.
    pub fn interpolate(&self, config: &InterpolationConfig) -> Result<Node> {
        interpolate(self.clone(), config)
    }

    /// Root value handle, if this node is one.
    pub fn as_value(&self) -> Option<AnimatedValue> {
        AnimatedValue::from_node(self)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0.kind, NodeKind::Tracking(_) | NodeKind::Props(_))
    }

    /// Push the recomputed value outward. Only leaves react.
    pub fn update(&self) {
        match &self.0.kind {
            NodeKind::Tracking(tracking) => tracking.update(),
            NodeKind::Props(props) => (props.callback)(),
            _ => {}
        }
    }

    pub(crate) fn parents(&self) -> Vec<Node> {
        self.0.parents()
    }

    pub(crate) fn attach(&self) {
        if self.0.attached.replace(true) {
            return;
        }
        for parent in self.parents() {
            parent.add_child(self);
        }
    }

    pub(crate) fn detach(&self) {
        self.0.detach();
    }

    pub(crate) fn notify_listeners(&self) {
        if self.0.listeners.is_empty() {
            return;
        }
        let value = self.value();
        self.0.listeners.notify(&value);
    }

    fn subscribe_to_parents(&self) {
        if self.0.parent_subscriptions.borrow().is_some() {
            return;
        }
        *self.0.parent_subscriptions.borrow_mut() = Some(Vec::new());
        let weak = Rc::downgrade(&self.0);
        let subscriptions: Vec<(Node, ListenerId)> = self
            .parents()
            .into_iter()
            .map(|parent| {
                let weak = weak.clone();
                let id = parent.add_listener_rc(Rc::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        Node(inner).notify_listeners();
                    }
                }));
                (parent, id)
            })
            .collect();
        *self.0.parent_subscriptions.borrow_mut() = Some(subscriptions);
    }
}

impl NodeInner {
    fn parents(&self) -> Vec<Node> {
        match &self.kind {
            NodeKind::Value(_) => Vec::new(),
            NodeKind::Interpolation { parent, .. } => vec![parent.clone()],
            NodeKind::Addition { a, b } | NodeKind::Multiplication { a, b } => {
                vec![a.clone(), b.clone()]
            }
            NodeKind::Modulo { a, .. } => vec![a.clone()],
            NodeKind::Template { values, .. } => {
                values.iter().filter_map(Entry::node).cloned().collect()
            }
            NodeKind::Tracking(tracking) => vec![tracking.parent.clone()],
            NodeKind::Props(props) => props
                .entries
                .values()
                .filter_map(Entry::node)
                .cloned()
                .collect(),
        }
    }

    fn remove_child_ptr(&self, child: *const NodeInner) {
        let remaining = {
            let mut children = self.children.borrow_mut();
            children
                .iter()
                .position(|weak| std::ptr::eq(weak.as_ptr(), child))
                .map(|idx| {
                    children.remove(idx);
                    children.len()
                })
        };
        match remaining {
            None => warn!(
                "trying to remove a child that doesn't exist from a {} node",
                self.kind.name()
            ),
            Some(0) => self.detach(),
            Some(_) => {}
        }
    }

    fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        let me: *const NodeInner = self;
        for parent in self.parents() {
            parent.0.remove_child_ptr(me);
        }
        match &self.kind {
            NodeKind::Value(state) => state.halt(),
            NodeKind::Interpolation { .. } => self.drop_parent_subscriptions(),
            _ => {}
        }
    }

    fn drop_parent_subscriptions(&self) {
        let subscriptions = self.parent_subscriptions.borrow_mut().take();
        for (parent, id) in subscriptions.into_iter().flatten() {
            parent.remove_listener(id);
        }
    }
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        self.detach();
        self.drop_parent_subscriptions();
        if let NodeKind::Value(state) = &self.kind {
            state.halt();
        }
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        AnimatedValue::new(value).into_node()
    }
}

impl From<&Node> for Node {
    fn from(node: &Node) -> Self {
        node.clone()
    }
}

impl From<AnimatedValue> for Node {
    fn from(value: AnimatedValue) -> Self {
        value.into_node()
    }
}

impl From<&AnimatedValue> for Node {
    fn from(value: &AnimatedValue) -> Self {
        value.node().clone()
    }
}

/// Recompute every leaf reachable from `root` exactly once.
///
/// Discovery walks live children depth first and stops at leaves; a leaf reached
/// through several paths is collected once, in first-discovery order.
pub(crate) fn flush(root: &Node) {
    let mut seen: HashSet<*const NodeInner> = HashSet::new();
    let mut leaves: Vec<Node> = Vec::new();
    collect_leaves(root, &mut seen, &mut leaves);
    trace!("flush: {} leaves", leaves.len());
    for leaf in leaves {
        leaf.update();
    }
}

fn collect_leaves(node: &Node, seen: &mut HashSet<*const NodeInner>, leaves: &mut Vec<Node>) {
    if node.is_leaf() {
        if seen.insert(Rc::as_ptr(&node.0)) {
            leaves.push(node.clone());
        }
        return;
    }
    for child in node.children() {
        collect_leaves(&child, seen, leaves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_props(entries: Vec<(&str, Entry)>, hits: &Rc<Cell<u32>>) -> AnimatedProps {
        let hits = hits.clone();
        AnimatedProps::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            move || hits.set(hits.get() + 1),
        )
    }

    #[test]
    fn liveness_follows_child_count() {
        let root = AnimatedValue::new(0.0);
        let interp = root
            .interpolate(&InterpolationConfig::new(vec![0.0, 1.0], vec![0.0, 10.0]))
            .expect("valid");
        assert!(!interp.is_attached());
        assert_eq!(root.node().child_count(), 0);

        let hits = Rc::new(Cell::new(0));
        let props = counting_props(vec![("x", Entry::from(&interp))], &hits);
        assert!(interp.is_attached());
        assert_eq!(root.node().child_count(), 1);

        props.detach();
        assert!(!interp.is_attached());
        assert_eq!(root.node().child_count(), 0);
    }

    #[test]
    fn dropping_a_leaf_releases_its_registrations() {
        let root = AnimatedValue::new(0.0);
        let hits = Rc::new(Cell::new(0));
        {
            let _props = counting_props(vec![("x", Entry::from(&root))], &hits);
            assert_eq!(root.node().child_count(), 1);
        }
        assert_eq!(root.node().child_count(), 0);
        root.set_value(1.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn only_roots_convert_back_to_values() {
        let root = AnimatedValue::new(2.0);
        let sum = add(&root, 1.0).expect("numeric");
        let again = root.node().as_value().expect("root");
        again.set_value(5.0);
        assert_eq!(root.value(), 5.0);
        assert!(sum.as_value().is_none());
    }

    #[test]
    fn template_renders_numbers_like_a_script_host() {
        let a = AnimatedValue::new(1.5);
        let node = template(
            vec!["translate(".into(), "px, ".into(), "px)".into()],
            vec![Entry::from(&a), Entry::from(2.0)],
        )
        .expect("valid arity");
        assert_eq!(node.value(), Value::Text("translate(1.5px, 2px)".into()));
        assert_eq!(node.output_kind(), ValueKind::Text);
    }

    #[test]
    fn animated_value_of_props_skips_static_entries() {
        let a = AnimatedValue::new(3.0);
        let hits = Rc::new(Cell::new(0));
        let props = counting_props(
            vec![
                ("opacity", Entry::from(&a)),
                ("label", Entry::from("fixed")),
            ],
            &hits,
        );
        let all = props.value();
        let animated = props.animated_value();
        assert_eq!(all.as_record().map(|m| m.len()), Some(2));
        let animated = animated.as_record().expect("record");
        assert_eq!(animated.len(), 1);
        assert_eq!(animated.get("opacity"), Some(&Value::Float(3.0)));
    }
}
