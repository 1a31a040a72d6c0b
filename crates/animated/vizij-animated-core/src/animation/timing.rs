use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::{Animation, DriverCore, EndCallback, Phase, ToValue, UpdateCallback};
use crate::easing::Easing;
use crate::runtime::AnimationRuntime;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub to_value: ToValue,
    /// Milliseconds.
    pub duration: f64,
    /// Milliseconds before motion begins.
    pub delay: f64,
    pub easing: Easing,
    pub is_interaction: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            to_value: ToValue::default(),
            duration: 500.0,
            delay: 0.0,
            easing: Easing::timing_default(),
            is_interaction: true,
        }
    }
}

impl TimingConfig {
    pub fn to(to_value: impl Into<ToValue>) -> Self {
        Self {
            to_value: to_value.into(),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_interaction(mut self, is_interaction: bool) -> Self {
        self.is_interaction = is_interaction;
        self
    }
}

/// Eased motion over a fixed duration.
#[derive(Debug)]
pub struct TimingAnimation {
    me: Weak<TimingAnimation>,
    core: DriverCore,
    to_value: f64,
    duration: f64,
    delay: f64,
    easing: Easing,
    from: Cell<f64>,
    start_time: Cell<f64>,
}

impl TimingAnimation {
    /// A node target is sampled once, here.
    pub fn new(config: &TimingConfig, runtime: AnimationRuntime) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core: DriverCore::new("timing", runtime, config.is_interaction),
            to_value: config.to_value.resolve(),
            duration: config.duration,
            delay: config.delay,
            easing: config.easing.clone(),
            from: Cell::new(0.0),
            start_time: Cell::new(0.0),
        })
    }

    fn begin_motion(&self) {
        self.core.timer_fired();
        if !self.core.is_running() {
            return;
        }
        if self.duration == 0.0 {
            self.core.emit(self.to_value);
            self.core.finish(true);
        } else {
            self.start_time.set(self.core.runtime().now());
            self.schedule();
        }
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
        let from = self.from.get();
        let span = self.to_value - from;
        let elapsed = now - self.start_time.get();

        if elapsed >= self.duration {
            self.core.emit(from + self.easing.apply(1.0) * span);
            self.core.finish(true);
            return;
        }

        self.core
            .emit(from + self.easing.apply(elapsed / self.duration) * span);
        self.schedule();
    }
}

impl Animation for TimingAnimation {
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
        if self.delay > 0.0 {
            let me = self.me.clone();
            self.core.set_timeout(
                self.delay,
                Box::new(move || {
                    if let Some(me) = me.upgrade() {
                        me.begin_motion();
                    }
                }),
            );
        } else {
            self.begin_motion();
        }
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
