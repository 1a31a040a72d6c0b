//! Identifiers handed out to hosts.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Key of a value-change listener registration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Opaque handle returned by [`FrameScheduler::request_frame`](crate::runtime::FrameScheduler::request_frame).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Opaque handle returned by [`DeferredCalls::set_timeout`](crate::runtime::DeferredCalls::set_timeout).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Opaque handle returned by [`InteractionTracker::create_interaction_handle`](crate::runtime::InteractionTracker::create_interaction_handle).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InteractionHandle(pub u64);

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(0);

/// Process-wide monotonic listener ids; ids are never reused.
#[inline]
pub fn next_listener_id() -> ListenerId {
    ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed))
}

/// Monotonic allocator for per-runtime handles (frames, timers, interactions).
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_frame: u64,
    next_timer: u64,
    next_interaction: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_frame(&mut self) -> FrameHandle {
        let id = FrameHandle(self.next_frame);
        self.next_frame = self.next_frame.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_timer(&mut self) -> TimerHandle {
        let id = TimerHandle(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_interaction(&mut self) -> InteractionHandle {
        let id = InteractionHandle(self.next_interaction);
        self.next_interaction = self.next_interaction.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_frame(), FrameHandle(0));
        assert_eq!(alloc.alloc_frame(), FrameHandle(1));
        assert_eq!(alloc.alloc_timer(), TimerHandle(0));
        assert_eq!(alloc.alloc_interaction(), InteractionHandle(0));
        assert_eq!(alloc.alloc_interaction(), InteractionHandle(1));
    }

    #[test]
    fn listener_ids_are_unique() {
        let a = next_listener_id();
        let b = next_listener_id();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }
}
