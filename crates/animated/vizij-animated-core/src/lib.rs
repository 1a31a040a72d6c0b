//! Vizij Animated Core (engine-agnostic)
//!
//! Animated values and the dependency graph built on top of them: root values
//! are driven by timing, spring or decay drivers (alone or composed), derived
//! nodes map them through arithmetic, templates and range interpolation, and
//! leaves push the recomputed values out to the host once per commit.
//!
//! Everything is single-threaded. Drivers reach the host's frame scheduler,
//! timers, clock and interaction registry through an [`AnimationRuntime`];
//! [`FrameLoop`] is a manually stepped implementation of all of them.

pub mod animation;
pub mod bezier;
pub mod color;
pub mod composite;
pub mod easing;
pub mod error;
pub mod event;
pub mod frame_loop;
pub mod graph;
pub mod ids;
pub mod interpolation;
pub mod runtime;
pub mod value;

// Re-exports for hosts
pub use animation::{
    Animation, DecayAnimation, DecayConfig, EndCallback, EndResult, KinematicState, Phase,
    SpringAnimation, SpringConfig, SpringParams, TimingAnimation, TimingConfig, ToValue,
    UpdateCallback,
};
pub use bezier::BezierEasing;
pub use composite::{
    decay, decay_xy, delay, parallel, sequence, spring, spring_xy, stagger, start, timing,
    timing_xy, Composite, CompositeAnimation, ParallelConfig,
};
pub use easing::Easing;
pub use error::{AnimatedError, Result};
pub use event::{event, EventHandler, EventListener, EventMapping};
pub use frame_loop::FrameLoop;
pub use graph::{
    add, interpolate, modulo, multiply, template, AnimatedProps, AnimatedValue, AnimatedValueXY,
    AnimationFactory, Entry, Node, SessionEndCallback, XY,
};
pub use ids::{FrameHandle, InteractionHandle, ListenerId, TimerHandle};
pub use interpolation::{Extrapolate, Interpolation, InterpolationConfig, OutputRange};
pub use runtime::{
    AnimationRuntime, Clock, DeferredCalls, FrameScheduler, InteractionTracker, NoInteractions,
};
pub use value::{Value, ValueKind};
