//! Timer registry composed over the host scheduling capability.
//!
//! Tracked timers are the ones scripts create; they are recorded on creation so
//! `cancel_all` can tear every one of them down. Untracked timers (frame ticks,
//! startup steps) go straight to the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{CallbackId, TimerHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Once,
    Periodic,
}

/// What the session should do when a timer fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimerTask {
    /// Advance the playback clock by one frame.
    Tick,
    /// Deferred startup: evaluate the project script.
    RunScript,
    /// Deferred startup: begin playback.
    AutoPlay,
    /// Invoke a script callback.
    Script(CallbackId),
}

/// Host scheduling primitive: delayed and repeating execution plus cancellation.
///
/// When a timer fires, the host hands `(handle, task)` back to `Session::dispatch`.
/// Cancelling an unknown or already-fired handle must be a no-op.
pub trait Scheduler {
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64, task: TimerTask) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Negative or non-finite delays run as soon as possible.
#[inline]
fn sanitize_delay(delay_ms: f64) -> f64 {
    if delay_ms.is_finite() && delay_ms > 0.0 {
        delay_ms
    } else {
        0.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct TrackedTimer {
    handle: TimerHandle,
    kind: TimerKind,
}

pub struct TimerRegistry {
    scheduler: Box<dyn Scheduler>,
    tracked: Vec<TrackedTimer>,
}

impl fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("tracked", &self.tracked)
            .finish_non_exhaustive()
    }
}

impl TimerRegistry {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            tracked: Vec::new(),
        }
    }

    /// Schedule and record a timer so `cancel_all` can reach it.
    pub fn schedule_tracked(
        &mut self,
        kind: TimerKind,
        delay_ms: f64,
        task: TimerTask,
    ) -> TimerHandle {
        let handle = self
            .scheduler
            .schedule(kind, sanitize_delay(delay_ms), task);
        self.tracked.push(TrackedTimer { handle, kind });
        handle
    }

    /// Schedule a one-shot timer that is not recorded.
    pub fn schedule_untracked(&mut self, delay_ms: f64, task: TimerTask) -> TimerHandle {
        self.scheduler
            .schedule(TimerKind::Once, sanitize_delay(delay_ms), task)
    }

    /// Cancel one timer, tracked or not.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.scheduler.cancel(handle);
        self.tracked.retain(|t| t.handle != handle);
    }

    /// Cancel every tracked timer and clear the record. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let drained: Vec<TrackedTimer> = self.tracked.drain(..).collect();
        for t in &drained {
            self.scheduler.cancel(t.handle);
        }
        if !drained.is_empty() {
            log::debug!(target: "keyreel", "cancelled {} tracked timers", drained.len());
        }
        drained.len()
    }

    /// A tracked one-shot timer fired; drop it from the record. Periodic timers stay.
    pub fn note_fired(&mut self, handle: TimerHandle) {
        self.tracked
            .retain(|t| !(t.handle == handle && t.kind == TimerKind::Once));
    }

    pub fn is_tracked(&self, handle: TimerHandle) -> bool {
        self.tracked.iter().any(|t| t.handle == handle)
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn tracked_handles(&self) -> Vec<TimerHandle> {
        self.tracked.iter().map(|t| t.handle).collect()
    }
}
