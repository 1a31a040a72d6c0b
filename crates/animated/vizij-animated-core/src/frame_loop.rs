//! Manually stepped host loop.
//!
//! `FrameLoop` implements every collaborator in [`crate::runtime`] on top of a
//! virtual millisecond clock. Hosts without their own scheduler (and the test
//! suite) drive animations by calling [`FrameLoop::step`] once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashSet;

use crate::ids::{FrameHandle, IdAllocator, InteractionHandle, TimerHandle};
use crate::runtime::{
    AnimationRuntime, Callback, Clock, DeferredCalls, FrameScheduler, InteractionTracker,
};

struct PendingTimer {
    handle: TimerHandle,
    due: f64,
    callback: Callback,
}

#[derive(Default)]
struct LoopState {
    now: f64,
    ids: IdAllocator,
    frames: Vec<(FrameHandle, Callback)>,
    /// Kept in insertion order; ties on `due` fire in that order.
    timers: Vec<PendingTimer>,
    interactions: HashSet<InteractionHandle>,
}

#[derive(Default)]
struct LoopInner {
    state: RefCell<LoopState>,
}

/// Deterministic single-threaded scheduler, clock and interaction registry.
#[derive(Clone, Default)]
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("FrameLoop")
            .field("now", &state.now)
            .field("frames", &state.frames.len())
            .field("timers", &state.timers.len())
            .field("interactions", &state.interactions.len())
            .finish()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `now_ms` instead of zero.
    pub fn starting_at(now_ms: f64) -> Self {
        let frame_loop = Self::default();
        frame_loop.inner.state.borrow_mut().now = now_ms;
        frame_loop
    }

    /// Collaborator bundle backed by this loop.
    pub fn runtime(&self) -> AnimationRuntime {
        AnimationRuntime::new(
            self.inner.clone(),
            self.inner.clone(),
            self.inner.clone(),
            self.inner.clone(),
        )
    }

    pub fn now(&self) -> f64 {
        self.inner.state.borrow().now
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.state.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.state.borrow().timers.len()
    }

    pub fn active_interactions(&self) -> usize {
        self.inner.state.borrow().interactions.len()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.inner.state.borrow();
        state.frames.is_empty() && state.timers.is_empty()
    }

    /// Advance the clock by `dt_ms`, fire due timers, then run the frame callbacks
    /// pending at that point. Frames requested by those callbacks wait for the
    /// next step. Returns how many frame callbacks ran.
    pub fn step(&self, dt_ms: f64) -> usize {
        let now = {
            let mut state = self.inner.state.borrow_mut();
            state.now += dt_ms;
            state.now
        };

        while let Some(callback) = self.take_due_timer(now) {
            callback();
        }

        let batch: Vec<FrameHandle> = self
            .inner
            .state
            .borrow()
            .frames
            .iter()
            .map(|(handle, _)| *handle)
            .collect();
        let mut ran = 0;
        for handle in batch {
            let callback = {
                let mut state = self.inner.state.borrow_mut();
                state
                    .frames
                    .iter()
                    .position(|(h, _)| *h == handle)
                    .map(|idx| state.frames.remove(idx).1)
            };
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Step every `frame_ms` until nothing is pending or `max_frames` steps were
    /// taken. Returns the number of steps.
    pub fn run_until_idle(&self, frame_ms: f64, max_frames: usize) -> usize {
        let mut steps = 0;
        while steps < max_frames && !self.is_idle() {
            self.step(frame_ms);
            steps += 1;
        }
        steps
    }

    fn take_due_timer(&self, now: f64) -> Option<Callback> {
        let mut state = self.inner.state.borrow_mut();
        let mut earliest: Option<usize> = None;
        for (idx, timer) in state.timers.iter().enumerate() {
            if timer.due > now {
                continue;
            }
            match earliest {
                Some(best) if state.timers[best].due <= timer.due => {}
                _ => earliest = Some(idx),
            }
        }
        earliest.map(|idx| state.timers.remove(idx).callback)
    }
}

impl FrameScheduler for LoopInner {
    fn request_frame(&self, callback: Callback) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.ids.alloc_frame();
        state.frames.push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        // Dropping the callback may release the last reference to a driver, so it
        // is dropped after the borrow ends.
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .frames
                .iter()
                .position(|(h, _)| *h == handle)
                .map(|idx| state.frames.remove(idx))
        };
        drop(removed);
    }
}

impl DeferredCalls for LoopInner {
    fn set_timeout(&self, delay_ms: f64, callback: Callback) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.ids.alloc_timer();
        let due = state.now + delay_ms.max(0.0);
        state.timers.push(PendingTimer {
            handle,
            due,
            callback,
        });
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .timers
                .iter()
                .position(|t| t.handle == handle)
                .map(|idx| state.timers.remove(idx))
        };
        drop(removed);
    }
}

impl InteractionTracker for LoopInner {
    fn create_interaction_handle(&self) -> InteractionHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.ids.alloc_interaction();
        state.interactions.insert(handle);
        handle
    }

    fn clear_interaction_handle(&self, handle: InteractionHandle) {
        self.state.borrow_mut().interactions.remove(&handle);
    }
}

impl Clock for LoopInner {
    fn now(&self) -> f64 {
        self.state.borrow().now
    }
}
