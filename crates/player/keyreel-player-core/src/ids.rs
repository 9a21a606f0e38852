//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Opaque handle returned by the host scheduling primitive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u32);

/// Surface-assigned key of a scene object (its position in the surface's object list).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(pub u32);

/// Key of a script callback registered through a tracked timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CallbackId(pub u32);

/// Monotonic allocator for timer handles and callback ids.
/// Handles start at 1 so hosts that treat 0 as "no timer" never see it.
#[derive(Debug)]
pub struct IdAllocator {
    next_timer: u32,
    next_callback: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_timer: 1,
            next_callback: 1,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_timer(&mut self) -> TimerHandle {
        let id = TimerHandle(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1).max(1);
        id
    }

    #[inline]
    pub fn alloc_callback(&mut self) -> CallbackId {
        let id = CallbackId(self.next_callback);
        self.next_callback = self.next_callback.wrapping_add(1).max(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
