//! Startable, stoppable compositions of drivers.
//!
//! The single-value constructors (`timing`, `spring`, `decay`) bind a driver
//! config to a root value; `sequence`, `parallel`, `stagger` and `delay` combine
//! any composites. A composite can be started again after it ends.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::animation::{
    Animation, DecayAnimation, DecayConfig, EndCallback, EndResult, SpringAnimation, SpringConfig,
    SpringParams, TimingAnimation, TimingConfig, ToValue,
};
use crate::error::Result;
use crate::graph::{AnimatedValue, AnimatedValueXY, AnimationFactory, SessionEndCallback};
use crate::runtime::AnimationRuntime;

/// A composition handed to the host.
pub trait CompositeAnimation {
    /// Begin running; `callback` fires once when the composition ends.
    fn start(self: Rc<Self>, callback: Option<EndCallback>);
    fn stop(&self);
}

pub type Composite = Rc<dyn CompositeAnimation>;

/// Start `composite` without giving up the caller's handle.
pub fn start(composite: &Composite, callback: Option<EndCallback>) {
    composite.clone().start(callback);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Stop every other child once one ends unfinished.
    pub stop_together: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            stop_together: true,
        }
    }
}

/// Forward only the first session end of a tracking relation.
fn first_session_only(callback: Option<EndCallback>) -> Option<SessionEndCallback> {
    let slot = RefCell::new(Some(callback?));
    Some(Rc::new(move |result| {
        let callback = slot.borrow_mut().take();
        if let Some(callback) = callback {
            callback(result);
        }
    }))
}

enum DriverKind {
    Timing(TimingConfig),
    Spring(SpringConfig, SpringParams),
    Decay(DecayConfig),
}

impl DriverKind {
    fn build(&self, runtime: &AnimationRuntime) -> Rc<dyn Animation> {
        match self {
            DriverKind::Timing(config) => TimingAnimation::new(config, runtime.clone()),
            DriverKind::Spring(config, params) => {
                SpringAnimation::with_params(config, *params, runtime.clone())
            }
            DriverKind::Decay(config) => DecayAnimation::new(config, runtime.clone()),
        }
    }

    fn target(&self) -> Option<&ToValue> {
        match self {
            DriverKind::Timing(config) => Some(&config.to_value),
            DriverKind::Spring(config, _) => Some(&config.to_value),
            DriverKind::Decay(_) => None,
        }
    }

    /// Same driver aimed at a fixed number.
    fn retargeted(&self, to: f64) -> DriverKind {
        match self {
            DriverKind::Timing(config) => DriverKind::Timing(TimingConfig {
                to_value: ToValue::Number(to),
                ..config.clone()
            }),
            DriverKind::Spring(config, params) => DriverKind::Spring(
                SpringConfig {
                    to_value: ToValue::Number(to),
                    ..config.clone()
                },
                *params,
            ),
            DriverKind::Decay(config) => DriverKind::Decay(config.clone()),
        }
    }
}

/// One driver bound to one root value.
struct SingleValue {
    value: AnimatedValue,
    driver: Rc<DriverKind>,
    runtime: AnimationRuntime,
}

impl CompositeAnimation for SingleValue {
    fn start(self: Rc<Self>, callback: Option<EndCallback>) {
        self.value.stop_tracking();
        if let Some(target) = self.driver.target().and_then(ToValue::as_node) {
            debug!("composite tracking {target:?}");
            let driver = self.driver.clone();
            let runtime = self.runtime.clone();
            let factory: AnimationFactory =
                Rc::new(move |to| driver.retargeted(to).build(&runtime));
            self.value
                .track(target, factory, first_session_only(callback));
        } else {
            self.value
                .animate(self.driver.build(&self.runtime), callback);
        }
    }

    fn stop(&self) {
        self.value.stop_animation();
    }
}

fn single(value: &AnimatedValue, driver: DriverKind, runtime: AnimationRuntime) -> Composite {
    Rc::new(SingleValue {
        value: value.clone(),
        driver: Rc::new(driver),
        runtime,
    })
}

/// Eased motion of `value` towards `config.to_value`. A node target is tracked.
pub fn timing(value: &AnimatedValue, config: TimingConfig, runtime: AnimationRuntime) -> Composite {
    single(value, DriverKind::Timing(config), runtime)
}

/// Spring motion of `value`. Fails when `config` mixes parameterisations.
pub fn spring(
    value: &AnimatedValue,
    config: SpringConfig,
    runtime: AnimationRuntime,
) -> Result<Composite> {
    let params = config.params()?;
    Ok(single(value, DriverKind::Spring(config, params), runtime))
}

pub fn decay(value: &AnimatedValue, config: DecayConfig, runtime: AnimationRuntime) -> Composite {
    single(value, DriverKind::Decay(config), runtime)
}

/// Per-axis timing on a vector; axes never stop each other.
pub fn timing_xy(
    value: &AnimatedValueXY,
    config_x: TimingConfig,
    config_y: TimingConfig,
    runtime: AnimationRuntime,
) -> Composite {
    vector(
        timing(&value.x, config_x, runtime.clone()),
        timing(&value.y, config_y, runtime),
    )
}

pub fn spring_xy(
    value: &AnimatedValueXY,
    config_x: SpringConfig,
    config_y: SpringConfig,
    runtime: AnimationRuntime,
) -> Result<Composite> {
    Ok(vector(
        spring(&value.x, config_x, runtime.clone())?,
        spring(&value.y, config_y, runtime)?,
    ))
}

pub fn decay_xy(
    value: &AnimatedValueXY,
    config_x: DecayConfig,
    config_y: DecayConfig,
    runtime: AnimationRuntime,
) -> Composite {
    vector(
        decay(&value.x, config_x, runtime.clone()),
        decay(&value.y, config_y, runtime),
    )
}

fn vector(x: Composite, y: Composite) -> Composite {
    parallel(
        vec![x, y],
        ParallelConfig {
            stop_together: false,
        },
    )
}

/// Run `animations` one after another. The chain ends early, with the failing
/// result, as soon as a child ends unfinished.
pub fn sequence(animations: Vec<Composite>) -> Composite {
    Rc::new(Sequence {
        animations,
        current: Cell::new(0),
    })
}

struct Sequence {
    animations: Vec<Composite>,
    current: Cell<usize>,
}

impl Sequence {
    fn run_current(self: Rc<Self>, callback: Option<EndCallback>) {
        let child = self.animations[self.current.get()].clone();
        let me = self.clone();
        child.start(Some(Box::new(move |result| {
            me.child_ended(result, callback)
        })));
    }

    fn child_ended(self: Rc<Self>, result: EndResult, callback: Option<EndCallback>) {
        if !result.finished {
            if let Some(callback) = callback {
                callback(result);
            }
            return;
        }
        self.current.set(self.current.get() + 1);
        if self.current.get() >= self.animations.len() {
            if let Some(callback) = callback {
                callback(result);
            }
            return;
        }
        self.run_current(callback);
    }
}

impl CompositeAnimation for Sequence {
    fn start(self: Rc<Self>, callback: Option<EndCallback>) {
        if self.animations.is_empty() {
            if let Some(callback) = callback {
                callback(EndResult::FINISHED);
            }
            return;
        }
        // An interrupted sequence resumes at the child that was stopped.
        if self.current.get() >= self.animations.len() {
            self.current.set(0);
        }
        self.run_current(callback);
    }

    fn stop(&self) {
        if let Some(child) = self.animations.get(self.current.get()) {
            child.stop();
        }
    }
}

/// Run `animations` together; ends with the result of the last child to end.
pub fn parallel(animations: Vec<Composite>, config: ParallelConfig) -> Composite {
    let len = animations.len();
    Rc::new(Parallel {
        animations,
        stop_together: config.stop_together,
        generation: Cell::new(0),
        done: Cell::new(0),
        has_ended: RefCell::new(vec![false; len]),
        callback: RefCell::new(None),
    })
}

struct Parallel {
    animations: Vec<Composite>,
    stop_together: bool,
    /// Bumped on every start; child ends from an earlier run are ignored.
    generation: Cell<u64>,
    done: Cell<usize>,
    /// Children already ended or stopped; each child is stopped at most once.
    has_ended: RefCell<Vec<bool>>,
    callback: RefCell<Option<EndCallback>>,
}

impl Parallel {
    fn child_ended(&self, generation: u64, idx: usize, result: EndResult) {
        if generation != self.generation.get() {
            return;
        }
        self.has_ended.borrow_mut()[idx] = true;
        let done = self.done.get() + 1;
        self.done.set(done);
        if done == self.animations.len() {
            let callback = self.callback.borrow_mut().take();
            if let Some(callback) = callback {
                callback(result);
            }
            return;
        }
        if !result.finished && self.stop_together {
            self.stop();
        }
    }
}

impl CompositeAnimation for Parallel {
    fn start(self: Rc<Self>, callback: Option<EndCallback>) {
        if self.animations.is_empty() {
            if let Some(callback) = callback {
                callback(EndResult::FINISHED);
            }
            return;
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.done.set(0);
        self.has_ended.borrow_mut().fill(false);
        let superseded = self.callback.replace(callback);

        for (idx, child) in self.animations.iter().enumerate() {
            let me = self.clone();
            child.clone().start(Some(Box::new(move |result| {
                me.child_ended(generation, idx, result);
            })));
        }

        if let Some(superseded) = superseded {
            debug!("parallel restarted while running");
            superseded(EndResult::STOPPED);
        }
    }

    fn stop(&self) {
        let pending: Vec<usize> = {
            let mut ended = self.has_ended.borrow_mut();
            ended
                .iter_mut()
                .enumerate()
                .filter_map(|(idx, ended)| (!std::mem::replace(ended, true)).then_some(idx))
                .collect()
        };
        for idx in pending {
            self.animations[idx].stop();
        }
    }
}

/// Wait `time` milliseconds, then finish.
pub fn delay(time: f64, runtime: AnimationRuntime) -> Composite {
    timing(
        &AnimatedValue::new(0.0),
        TimingConfig::to(0.0).with_duration(0.0).with_delay(time),
        runtime,
    )
}

/// Start `animations[i]` after `time * i` milliseconds, all in parallel.
pub fn stagger(time: f64, animations: Vec<Composite>, runtime: AnimationRuntime) -> Composite {
    let staged = animations
        .into_iter()
        .enumerate()
        .map(|(i, animation)| sequence(vec![delay(time * i as f64, runtime.clone()), animation]))
        .collect();
    parallel(staged, ParallelConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_loop::FrameLoop;

    #[test]
    fn empty_compositions_finish_immediately() {
        let frames = FrameLoop::new();
        for composite in [
            sequence(Vec::new()),
            parallel(Vec::new(), ParallelConfig::default()),
            stagger(10.0, Vec::new(), frames.runtime()),
        ] {
            let result = Rc::new(Cell::new(None));
            let r = result.clone();
            start(&composite, Some(Box::new(move |res| r.set(Some(res)))));
            assert_eq!(result.get(), Some(EndResult::FINISHED));
        }
    }

    #[test]
    fn spring_rejects_mixed_parameters() {
        let frames = FrameLoop::new();
        let value = AnimatedValue::new(0.0);
        let config = SpringConfig::to(1.0)
            .with_tension_and_friction(40.0, 7.0)
            .with_bounciness_and_speed(8.0, 12.0);
        assert!(spring(&value, config, frames.runtime()).is_err());
    }

    #[test]
    fn delay_waits_on_a_timer() {
        let frames = FrameLoop::new();
        let d = delay(100.0, frames.runtime());
        start(&d, None);
        assert_eq!(frames.pending_timers(), 1);
        assert_eq!(frames.pending_frames(), 0);
        frames.step(99.0);
        assert_eq!(frames.pending_timers(), 1);
        frames.step(1.0);
        assert!(frames.is_idle());
        assert_eq!(frames.active_interactions(), 0);
    }
}
