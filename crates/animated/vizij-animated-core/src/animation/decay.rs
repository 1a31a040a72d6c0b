use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::{Animation, DriverCore, EndCallback, Phase, UpdateCallback};
use crate::runtime::AnimationRuntime;

/// Successive positions closer than this end the decay.
const REST_DELTA: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Initial velocity in units per millisecond.
    pub velocity: f64,
    pub deceleration: f64,
    pub is_interaction: bool,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            deceleration: 0.998,
            is_interaction: true,
        }
    }
}

impl DecayConfig {
    pub fn with_velocity(velocity: f64) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }
}

/// Exponential slow-down from an initial velocity.
#[derive(Debug)]
pub struct DecayAnimation {
    me: Weak<DecayAnimation>,
    core: DriverCore,
    velocity: f64,
    deceleration: f64,
    from: Cell<f64>,
    last_value: Cell<f64>,
    start_time: Cell<f64>,
}

impl DecayAnimation {
    pub fn new(config: &DecayConfig, runtime: AnimationRuntime) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core: DriverCore::new("decay", runtime, config.is_interaction),
            velocity: config.velocity,
            deceleration: config.deceleration,
            from: Cell::new(0.0),
            last_value: Cell::new(0.0),
            start_time: Cell::new(0.0),
        })
    }

    /// Position at `elapsed_ms` after start.
    pub fn position_at(&self, elapsed_ms: f64) -> f64 {
        let k = 1.0 - self.deceleration;
        self.from.get() + (self.velocity / k) * (1.0 - (-k * elapsed_ms).exp())
    }

    fn schedule(&self) {
        let me = self.me.clone();
        self.core.request_frame(Box::new(move || {
            if let Some(me) = me.upgrade() {
                me.on_frame();
            }
        }));
    }

    fn on_frame(&self) {
        self.core.frame_fired();
        if !self.core.is_running() {
            return;
        }
        let now = self.core.runtime().now();
        let value = self.position_at(now - self.start_time.get());
        self.core.emit(value);

        if (self.last_value.get() - value).abs() < REST_DELTA {
            self.core.finish(true);
            return;
        }
        self.last_value.set(value);
        self.schedule();
    }
}

impl Animation for DecayAnimation {
    fn start(
        self: Rc<Self>,
        from: f64,
        on_update: UpdateCallback,
        on_end: Option<EndCallback>,
        _previous: Option<Rc<dyn Animation>>,
    ) {
        if !self.core.begin(on_update, on_end) {
            return;
        }
        self.from.set(from);
        self.last_value.set(from);
        self.start_time.set(self.core.runtime().now());
        self.schedule();
    }

    fn stop(&self) {
        self.core.finish(false);
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn is_interaction(&self) -> bool {
        self.core.is_interaction()
    }

    fn runtime(&self) -> &AnimationRuntime {
        self.core.runtime()
    }
}
