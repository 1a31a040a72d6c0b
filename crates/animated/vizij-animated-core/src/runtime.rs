//! Host collaborators consumed by the drivers.
//!
//! Nothing here is global: every driver receives an [`AnimationRuntime`] at
//! construction and talks to the host only through it.

use std::fmt;
use std::rc::Rc;

use crate::ids::{FrameHandle, InteractionHandle, TimerHandle};

/// Deferred work handed to the host.
pub type Callback = Box<dyn FnOnce()>;

/// Delivers the next tick.
pub trait FrameScheduler {
    fn request_frame(&self, callback: Callback) -> FrameHandle;
    /// Cancelling an unknown or already-fired handle is a no-op.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Delayed one-shot invocations.
pub trait DeferredCalls {
    fn set_timeout(&self, delay_ms: f64, callback: Callback) -> TimerHandle;
    fn clear_timeout(&self, handle: TimerHandle);
}

/// Marks spans during which an interaction-relevant animation is running.
pub trait InteractionTracker {
    fn create_interaction_handle(&self) -> InteractionHandle;
    fn clear_interaction_handle(&self, handle: InteractionHandle);
}

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Interaction tracker that hands out handles and ignores them.
#[derive(Debug, Default)]
pub struct NoInteractions {
    next: std::cell::Cell<u64>,
}

impl InteractionTracker for NoInteractions {
    fn create_interaction_handle(&self) -> InteractionHandle {
        let id = self.next.get();
        self.next.set(id.wrapping_add(1));
        InteractionHandle(id)
    }

    fn clear_interaction_handle(&self, _handle: InteractionHandle) {}
}

/// Bundle of host collaborators shared by drivers.
#[derive(Clone)]
pub struct AnimationRuntime {
    frames: Rc<dyn FrameScheduler>,
    timers: Rc<dyn DeferredCalls>,
    interactions: Rc<dyn InteractionTracker>,
    clock: Rc<dyn Clock>,
}

impl fmt::Debug for AnimationRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRuntime").finish_non_exhaustive()
    }
}

impl AnimationRuntime {
    pub fn new(
        frames: Rc<dyn FrameScheduler>,
        timers: Rc<dyn DeferredCalls>,
        interactions: Rc<dyn InteractionTracker>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            frames,
            timers,
            interactions,
            clock,
        }
    }

    /// Replace the interaction tracker, keeping the other collaborators.
    pub fn with_interactions(mut self, interactions: Rc<dyn InteractionTracker>) -> Self {
        self.interactions = interactions;
        self
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn request_frame(&self, callback: Callback) -> FrameHandle {
        self.frames.request_frame(callback)
    }

    pub fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.cancel_frame(handle)
    }

    pub fn set_timeout(&self, delay_ms: f64, callback: Callback) -> TimerHandle {
        self.timers.set_timeout(delay_ms, callback)
    }

    pub fn clear_timeout(&self, handle: TimerHandle) {
        self.timers.clear_timeout(handle)
    }

    pub fn create_interaction_handle(&self) -> InteractionHandle {
        self.interactions.create_interaction_handle()
    }

    pub fn clear_interaction_handle(&self, handle: InteractionHandle) {
        self.interactions.clear_interaction_handle(handle)
    }
}
