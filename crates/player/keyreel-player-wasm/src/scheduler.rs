//! Browser timers behind the `Scheduler` trait.
//!
//! Every timer fires back into the session through a weak slot, so pending
//! timers never keep a dropped player alive. Periodic timers are chains of
//! one-shot `setTimeout` calls re-armed after each firing; no closure outlives
//! its own invocation, so a callback may cancel its own timer.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use keyreel_player_core::ids::IdAllocator;
use keyreel_player_core::{Scheduler, Session, TimerHandle, TimerKind, TimerTask};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::surface::js_error_text;

pub(crate) type SessionSlot = Rc<RefCell<Weak<RefCell<Session>>>>;

/// Handle -> current browser timeout id.
type LiveTimers = Rc<RefCell<HashMap<TimerHandle, i32>>>;

struct Armed {
    slot: SessionSlot,
    live: LiveTimers,
    handle: TimerHandle,
    kind: TimerKind,
    delay: i32,
    task: TimerTask,
}

pub(crate) struct BrowserScheduler {
    slot: SessionSlot,
    ids: IdAllocator,
    live: LiveTimers,
}

impl BrowserScheduler {
    pub(crate) fn new(slot: SessionSlot) -> Self {
        Self {
            slot,
            ids: IdAllocator::new(),
            live: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

fn dispatch(slot: &SessionSlot, handle: TimerHandle, task: TimerTask) {
    let Some(session) = slot.borrow().upgrade() else {
        return;
    };
    let Ok(mut session) = session.try_borrow_mut() else {
        log::warn!(target: "keyreel", "timer {handle:?} fired while the player was busy; dropped");
        return;
    };
    session.dispatch(handle, task);
}

/// Set a browser timeout for `armed` and record its id.
fn arm(armed: Armed) {
    let Some(window) = web_sys::window() else {
        log::error!(target: "keyreel", "no window; timer {:?} will never fire", armed.handle);
        return;
    };
    let (handle, delay, live) = (armed.handle, armed.delay, armed.live.clone());
    let callback = Closure::once_into_js(move || on_timeout(armed));
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay,
    ) {
        Ok(browser_id) => {
            live.borrow_mut().insert(handle, browser_id);
        }
        Err(e) => {
            live.borrow_mut().remove(&handle);
            log::error!(
                target: "keyreel",
                "browser refused timer {handle:?}: {}",
                js_error_text(&e)
            );
        }
    }
}

fn on_timeout(armed: Armed) {
    let handle = armed.handle;
    let still_live = match armed.kind {
        TimerKind::Once => armed.live.borrow_mut().remove(&handle).is_some(),
        TimerKind::Periodic => armed.live.borrow().contains_key(&handle),
    };
    if !still_live {
        return;
    }
    dispatch(&armed.slot, handle, armed.task);
    // The callback may have cancelled its own interval.
    if armed.kind == TimerKind::Periodic && armed.live.borrow().contains_key(&handle) {
        arm(armed);
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64, task: TimerTask) -> TimerHandle {
        let handle = self.ids.alloc_timer();
        let delay = delay_ms.round().clamp(0.0, i32::MAX as f64) as i32;
        let delay = match kind {
            TimerKind::Once => delay,
            TimerKind::Periodic => delay.max(1),
        };
        arm(Armed {
            slot: self.slot.clone(),
            live: self.live.clone(),
            handle,
            kind,
            delay,
            task,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let Some(browser_id) = self.live.borrow_mut().remove(&handle) else {
            return;
        };
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(browser_id);
        }
    }
}
