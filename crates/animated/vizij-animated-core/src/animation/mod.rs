//! Animation drivers.
//!
//! A driver produces a scalar trajectory for one root value. Every driver shares
//! the same lifecycle: it is started once, reports each new value through its
//! update callback and ends exactly once, either finished or stopped.

mod decay;
mod spring;
mod timing;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph::{AnimatedValue, Node};
use crate::ids::{FrameHandle, TimerHandle};
use crate::runtime::{AnimationRuntime, Callback};

pub use decay::{DecayAnimation, DecayConfig};
pub use spring::{
    from_bounciness_and_speed, from_origami_tension_and_friction, SpringAnimation, SpringConfig,
    SpringParams,
};
pub use timing::{TimingAnimation, TimingConfig};

/// Outcome reported when a driver ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndResult {
    /// `true` when the driver reached its natural end, `false` when stopped.
    pub finished: bool,
}

impl EndResult {
    pub const FINISHED: EndResult = EndResult { finished: true };
    pub const STOPPED: EndResult = EndResult { finished: false };
}

pub type EndCallback = Box<dyn FnOnce(EndResult)>;
pub type UpdateCallback = Rc<dyn Fn(f64)>;

/// Position, velocity and tick time a spring leaves behind, so a successor can
/// continue the motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub position: f64,
    pub velocity: f64,
    pub last_time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

/// Target of a driver: a fixed number, or a node to chase (tracking).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToValue {
    Number(f64),
    #[serde(skip)]
    Node(Node),
}

impl Default for ToValue {
    fn default() -> Self {
        ToValue::Number(0.0)
    }
}

impl ToValue {
    /// Current numeric target; nodes are sampled now.
    pub fn resolve(&self) -> f64 {
        match self {
            ToValue::Number(v) => *v,
            ToValue::Node(node) => node.value().to_float(),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            ToValue::Number(_) => None,
            ToValue::Node(node) => Some(node),
        }
    }
}

impl From<f64> for ToValue {
    fn from(v: f64) -> Self {
        ToValue::Number(v)
    }
}

impl From<Node> for ToValue {
    fn from(node: Node) -> Self {
        ToValue::Node(node)
    }
}

impl From<&AnimatedValue> for ToValue {
    fn from(value: &AnimatedValue) -> Self {
        ToValue::Node(value.node().clone())
    }
}

/// A one-shot scalar driver.
pub trait Animation {
    /// Begin producing values from `from`. `previous` is the driver this one
    /// replaces on the same root, already stopped.
    fn start(
        self: Rc<Self>,
        from: f64,
        on_update: UpdateCallback,
        on_end: Option<EndCallback>,
        previous: Option<Rc<dyn Animation>>,
    );

    /// End the driver as not finished. Idempotent and safe to call from inside
    /// its own callbacks.
    fn stop(&self);

    fn phase(&self) -> Phase;

    /// Whether the root should hold an interaction handle while this runs.
    fn is_interaction(&self) -> bool;

    fn runtime(&self) -> &AnimationRuntime;

    /// Motion state to hand over to a successor, for drivers that have one.
    fn kinematic_state(&self) -> Option<KinematicState> {
        None
    }
}

/// Lifecycle bookkeeping shared by the concrete drivers.
pub(crate) struct DriverCore {
    label: &'static str,
    runtime: AnimationRuntime,
    is_interaction: bool,
    phase: Cell<Phase>,
    on_update: RefCell<Option<UpdateCallback>>,
    on_end: RefCell<Option<EndCallback>>,
    frame: Cell<Option<FrameHandle>>,
    timer: Cell<Option<TimerHandle>>,
}

impl fmt::Debug for DriverCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverCore")
            .field("label", &self.label)
            .field("phase", &self.phase.get())
            .field("is_interaction", &self.is_interaction)
            .finish()
    }
}

impl DriverCore {
    pub(crate) fn new(
        label: &'static str,
        runtime: AnimationRuntime,
        is_interaction: bool,
    ) -> Self {
        Self {
            label,
            runtime,
            is_interaction,
            phase: Cell::new(Phase::Idle),
            on_update: RefCell::new(None),
            on_end: RefCell::new(None),
            frame: Cell::new(None),
            timer: Cell::new(None),
        }
    }

    pub(crate) fn runtime(&self) -> &AnimationRuntime {
        &self.runtime
    }

    pub(crate) fn is_interaction(&self) -> bool {
        self.is_interaction
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.phase.get() == Phase::Running
    }

    /// Move from idle to running. A driver that was already used reports
    /// not-finished straight away and returns `false`.
    pub(crate) fn begin(&self, on_update: UpdateCallback, on_end: Option<EndCallback>) -> bool {
        if self.phase.get() != Phase::Idle {
            debug!("{} driver started twice; ending immediately", self.label);
            if let Some(on_end) = on_end {
                on_end(EndResult::STOPPED);
            }
            return false;
        }
        self.phase.set(Phase::Running);
        *self.on_update.borrow_mut() = Some(on_update);
        *self.on_end.borrow_mut() = on_end;
        debug!("{} driver started", self.label);
        true
    }

    pub(crate) fn emit(&self, value: f64) {
        let on_update = self.on_update.borrow().clone();
        if let Some(on_update) = on_update {
            on_update(value);
        }
    }

    pub(crate) fn request_frame(&self, callback: Callback) {
        if self.is_running() {
            let handle = self.runtime.request_frame(callback);
            self.frame.set(Some(handle));
        }
    }

    pub(crate) fn frame_fired(&self) {
        self.frame.set(None);
    }

    pub(crate) fn set_timeout(&self, delay_ms: f64, callback: Callback) {
        if self.is_running() {
            let handle = self.runtime.set_timeout(delay_ms, callback);
            self.timer.set(Some(handle));
        }
    }

    pub(crate) fn timer_fired(&self) {
        self.timer.set(None);
    }

    /// End the driver once; later calls are no-ops.
    pub(crate) fn finish(&self, finished: bool) {
        match self.phase.get() {
            Phase::Running => {}
            Phase::Idle => {
                self.phase.set(Phase::Ended);
                return;
            }
            Phase::Ended => return,
        }
        self.phase.set(Phase::Ended);
        if let Some(handle) = self.frame.take() {
            self.runtime.cancel_frame(handle);
        }
        if let Some(handle) = self.timer.take() {
            self.runtime.clear_timeout(handle);
        }
        let on_update = self.on_update.borrow_mut().take();
        drop(on_update);
        let on_end = self.on_end.borrow_mut().take();
        debug!(
            "{} driver {}",
            self.label,
            if finished { "finished" } else { "stopped" }
        );
        if let Some(on_end) = on_end {
            on_end(EndResult { finished });
        }
    }
}
