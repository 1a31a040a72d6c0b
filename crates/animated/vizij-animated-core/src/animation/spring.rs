//! Damped spring integrated with fixed-step RK4.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Animation, DriverCore, EndCallback, KinematicState, Phase, ToValue, UpdateCallback};
use crate::error::{AnimatedError, Result};
use crate::runtime::AnimationRuntime;

/// Upper bound on integrated milliseconds per tick.
const MAX_STEPS: f64 = 64.0;
/// Integration step in milliseconds.
const TIMESTEP_MSEC: f64 = 1.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub to_value: ToValue,
    /// Initial velocity in units per second; overrides any carried-over velocity.
    pub velocity: Option<f64>,
    pub overshoot_clamping: bool,
    pub rest_displacement_threshold: f64,
    pub rest_speed_threshold: f64,
    /// Origami tension, exclusive with `bounciness`/`speed`.
    pub tension: Option<f64>,
    /// Origami friction, exclusive with `bounciness`/`speed`.
    pub friction: Option<f64>,
    pub bounciness: Option<f64>,
    pub speed: Option<f64>,
    pub is_interaction: bool,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            to_value: ToValue::default(),
            velocity: None,
            overshoot_clamping: false,
            rest_displacement_threshold: 0.001,
            rest_speed_threshold: 0.001,
            tension: None,
            friction: None,
            bounciness: None,
            speed: None,
            is_interaction: true,
        }
    }
}

impl SpringConfig {
    pub fn to(to_value: impl Into<ToValue>) -> Self {
        Self {
            to_value: to_value.into(),
            ..Self::default()
        }
    }

    pub fn with_tension_and_friction(mut self, tension: f64, friction: f64) -> Self {
        self.tension = Some(tension);
        self.friction = Some(friction);
        self
    }

    pub fn with_bounciness_and_speed(mut self, bounciness: f64, speed: f64) -> Self {
        self.bounciness = Some(bounciness);
        self.speed = Some(speed);
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_overshoot_clamping(mut self, clamp: bool) -> Self {
        self.overshoot_clamping = clamp;
        self
    }

    /// Physical tension and friction for this config.
    pub fn params(&self) -> Result<SpringParams> {
        if self.bounciness.is_some() || self.speed.is_some() {
            if self.tension.is_some() || self.friction.is_some() {
                return Err(AnimatedError::SpringParameterConflict);
            }
            return Ok(from_bounciness_and_speed(
                self.bounciness.unwrap_or(8.0),
                self.speed.unwrap_or(12.0),
            ));
        }
        Ok(from_origami_tension_and_friction(
            self.tension.unwrap_or(40.0),
            self.friction.unwrap_or(7.0),
        ))
    }
}

/// Physical spring constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub tension: f64,
    pub friction: f64,
}

fn tension_from_origami(value: f64) -> f64 {
    (value - 30.0) * 3.62 + 194.0
}

fn friction_from_origami(value: f64) -> f64 {
    (value - 8.0) * 3.0 + 25.0
}

pub fn from_origami_tension_and_friction(tension: f64, friction: f64) -> SpringParams {
    SpringParams {
        tension: tension_from_origami(tension),
        friction: friction_from_origami(friction),
    }
}

fn normalize(value: f64, start: f64, end: f64) -> f64 {
    (value - start) / (end - start)
}

fn project_normal(n: f64, start: f64, end: f64) -> f64 {
    start + n * (end - start)
}

fn linear_interpolation(t: f64, start: f64, end: f64) -> f64 {
    t * end + (1.0 - t) * start
}

fn quadratic_out_interpolation(t: f64, start: f64, end: f64) -> f64 {
    linear_interpolation(2.0 * t - t * t, start, end)
}

fn b3_friction1(x: f64) -> f64 {
    0.0007 * x.powi(3) - 0.031 * x.powi(2) + 0.64 * x + 1.28
}

fn b3_friction2(x: f64) -> f64 {
    0.000044 * x.powi(3) - 0.006 * x.powi(2) + 0.36 * x + 2.0
}

fn b3_friction3(x: f64) -> f64 {
    0.000_000_45 * x.powi(3) - 0.000332 * x.powi(2) + 0.1078 * x + 5.84
}

fn b3_nobounce(tension: f64) -> f64 {
    if tension <= 18.0 {
        b3_friction1(tension)
    } else if tension <= 44.0 {
        b3_friction2(tension)
    } else {
        b3_friction3(tension)
    }
}

/// Convert the designer-facing bounciness/speed pair into physical constants.
pub fn from_bounciness_and_speed(bounciness: f64, speed: f64) -> SpringParams {
    let b = project_normal(normalize(bounciness / 1.7, 0.0, 20.0), 0.0, 0.8);
    let s = normalize(speed / 1.7, 0.0, 20.0);
    let bouncy_tension = project_normal(s, 0.5, 200.0);
    let bouncy_friction = quadratic_out_interpolation(b, b3_nobounce(bouncy_tension), 0.01);
    SpringParams {
        tension: tension_from_origami(bouncy_tension),
        friction: friction_from_origami(bouncy_friction),
    }
}

/// Spring driver. Positions are integrated in 1 ms steps; velocity is per second.
#[derive(Debug)]
pub struct SpringAnimation {
    me: Weak<SpringAnimation>,
    core: DriverCore,
    to_value: f64,
    params: SpringParams,
    initial_velocity: Option<f64>,
    overshoot_clamping: bool,
    rest_displacement_threshold: f64,
    rest_speed_threshold: f64,
    start_position: Cell<f64>,
    last_position: Cell<f64>,
    last_velocity: Cell<f64>,
    last_time: Cell<f64>,
}

impl SpringAnimation {
    pub fn new(config: &SpringConfig, runtime: AnimationRuntime) -> Result<Rc<Self>> {
        let params = config.params()?;
        Ok(Self::with_params(config, params, runtime))
    }

    pub(crate) fn with_params(
        config: &SpringConfig,
        params: SpringParams,
        runtime: AnimationRuntime,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core: DriverCore::new("spring", runtime, config.is_interaction),
            to_value: config.to_value.resolve(),
            params,
            initial_velocity: config.velocity,
            overshoot_clamping: config.overshoot_clamping,
            rest_displacement_threshold: config.rest_displacement_threshold,
            rest_speed_threshold: config.rest_speed_threshold,
            start_position: Cell::new(0.0),
            last_position: Cell::new(0.0),
            last_velocity: Cell::new(config.velocity.unwrap_or(0.0)),
            last_time: Cell::new(0.0),
        })
    }

    pub fn params(&self) -> SpringParams {
        self.params
    }

    fn acceleration(&self, position: f64, velocity: f64) -> f64 {
        self.params.tension * (self.to_value - position) - self.params.friction * velocity
    }

    /// Advance `(position, velocity)` by one fixed step.
    fn rk4_step(&self, position: f64, velocity: f64) -> (f64, f64) {
        let step = TIMESTEP_MSEC / 1000.0;

        let a_velocity = velocity;
        let a_acceleration = self.acceleration(position, velocity);

        let b_velocity = velocity + a_acceleration * step / 2.0;
        let b_acceleration = self.acceleration(position + a_velocity * step / 2.0, b_velocity);

        let c_velocity = velocity + b_acceleration * step / 2.0;
        let c_acceleration = self.acceleration(position + b_velocity * step / 2.0, c_velocity);

        let d_velocity = velocity + c_acceleration * step;
        let d_acceleration = self.acceleration(position + c_velocity * step, d_velocity);

        let dxdt = (a_velocity + 2.0 * (b_velocity + c_velocity) + d_velocity) / 6.0;
        let dvdt =
            (a_acceleration + 2.0 * (b_acceleration + c_acceleration) + d_acceleration) / 6.0;

        (position + dxdt * step, velocity + dvdt * step)
    }

    fn schedule(&self) {
        let me = self.me.clone();
        self.core.request_frame(Box::new(move || {
            if let Some(me) = me.upgrade() {
                me.core.frame_fired();
                me.tick();
            }
        }));
    }

    fn tick(&self) {
        if !self.core.is_running() {
            return;
        }
        let last_time = self.last_time.get();
        let now = self.core.runtime().now().min(last_time + MAX_STEPS);
        let steps = ((now - last_time) / TIMESTEP_MSEC).floor().max(0.0) as usize;

        let mut position = self.last_position.get();
        let mut velocity = self.last_velocity.get();
        for _ in 0..steps {
            (position, velocity) = self.rk4_step(position, velocity);
        }

        self.last_time.set(now);
        self.last_position.set(position);
        self.last_velocity.set(velocity);

        self.core.emit(position);
        // An update listener may have stopped us.
        if !self.core.is_running() {
            return;
        }

        let tension = self.params.tension;
        let mut overshooting = false;
        if self.overshoot_clamping && tension != 0.0 {
            overshooting = if self.start_position.get() < self.to_value {
                position > self.to_value
            } else {
                position < self.to_value
            };
        }
        let resting_speed = velocity.abs() <= self.rest_speed_threshold;
        let resting_displacement =
            tension == 0.0 || (self.to_value - position).abs() <= self.rest_displacement_threshold;

        if overshooting || (resting_speed && resting_displacement) {
            if tension != 0.0 {
                self.core.emit(self.to_value);
            }
            self.core.finish(true);
            return;
        }
        self.schedule();
    }
}

impl Animation for SpringAnimation {
    fn start(
        self: Rc<Self>,
        from: f64,
        on_update: UpdateCallback,
        on_end: Option<EndCallback>,
        previous: Option<Rc<dyn Animation>>,
    ) {
        if !self.core.begin(on_update, on_end) {
            return;
        }
        self.start_position.set(from);
        self.last_position.set(from);
        self.last_time.set(self.core.runtime().now());

        if let Some(state) = previous.as_ref().and_then(|p| p.kinematic_state()) {
            debug!(
                "spring continuing from position {} velocity {}",
                state.position, state.velocity
            );
            self.last_position.set(state.position);
            self.last_velocity.set(state.velocity);
            self.last_time.set(state.last_time);
        }
        if let Some(velocity) = self.initial_velocity {
            self.last_velocity.set(velocity);
        }

        self.tick();
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

    fn kinematic_state(&self) -> Option<KinematicState> {
        Some(KinematicState {
            position: self.last_position.get(),
            velocity: self.last_velocity.get(),
            last_time: self.last_time.get(),
        })
    }
}
