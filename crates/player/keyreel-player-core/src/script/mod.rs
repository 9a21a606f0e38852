//! Script sandbox: runs the project script in an embedded `rhai` engine restricted
//! to a fixed capability set.
//!
//! Capabilities registered for scripts:
//! - `get_object_by_id(id)`, `get_objects_by_ids(ids)`
//! - `get_objects_by_class(name)`, `get_objects_by_classes(names)` (any of),
//!   `get_objects_by_all_classes(names)` (all of)
//! - `set_timeout(fn, ms)`, `set_interval(fn, ms)`, `clear_timer(handle)`
//! - `SceneObject` handles with `id`, `anim_id`, `key`, `classes`, `has_class(name)`,
//!   `set(name, value)` and `set_props(map)`
//!
//! Nothing else from the host is reachable: no clock, no playback state, no I/O.
//! `eval` is disabled and every evaluation runs under the configured resource limits.

mod convert;
mod object;

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use rhai::{Array, Dynamic, Engine, FnPtr, AST, INT};
use thiserror::Error;

use crate::config::SandboxCfg;
use crate::ids::{CallbackId, IdAllocator, TimerHandle};
use crate::query::ObjectQuery;
use crate::scene::{RenderSurface, SceneObject};
use crate::timers::{TimerKind, TimerRegistry, TimerTask};

pub use object::ScriptObject;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
    #[error("project script already ran in this session")]
    AlreadyRan,
    #[error("script failed to compile: {0}")]
    Compile(String),
    #[error("script error: {0}")]
    Runtime(String),
    #[error("no script callback registered as {0:?}")]
    UnknownCallback(CallbackId),
}

/// Everything a script may touch.
#[derive(Clone)]
pub struct Capabilities {
    pub surface: Rc<RefCell<dyn RenderSurface>>,
    pub timers: Rc<RefCell<TimerRegistry>>,
}

#[derive(Clone)]
struct ScriptCallback {
    callback: FnPtr,
    kind: TimerKind,
    handle: TimerHandle,
}

/// Callbacks waiting on tracked timers.
#[derive(Default)]
struct CallbackTable {
    ids: IdAllocator,
    entries: HashMap<CallbackId, ScriptCallback>,
}

impl CallbackTable {
    /// Take what is needed to run `id`. One-shot callbacks leave the table.
    fn checkout(&mut self, id: CallbackId) -> Option<FnPtr> {
        let kind = self.entries.get(&id)?.kind;
        match kind {
            TimerKind::Once => self.entries.remove(&id).map(|c| c.callback),
            TimerKind::Periodic => self.entries.get(&id).map(|c| c.callback.clone()),
        }
    }

    fn remove_handle(&mut self, handle: TimerHandle) {
        self.entries.retain(|_, c| c.handle != handle);
    }
}

pub struct ScriptSandbox {
    engine: Engine,
    ast: Option<AST>,
    ran: bool,
    callbacks: Rc<RefCell<CallbackTable>>,
}

impl ScriptSandbox {
    pub fn new(caps: Capabilities, cfg: &SandboxCfg) -> Self {
        let callbacks = Rc::new(RefCell::new(CallbackTable::default()));
        let mut engine = Engine::new();

        engine.set_max_operations(cfg.max_operations);
        engine.set_max_call_levels(cfg.max_call_levels);
        engine.set_max_expr_depths(cfg.max_expr_depth, cfg.max_expr_depth);
        engine.set_max_string_size(cfg.max_string_size);
        engine.set_max_array_size(cfg.max_array_size);
        engine.set_max_map_size(cfg.max_map_size);
        engine.disable_symbol("eval");

        engine.on_print(|text| log::info!(target: "keyreel::script", "{text}"));
        engine.on_debug(|text, source, pos| match source {
            Some(source) => log::debug!(target: "keyreel::script", "{source} @ {pos:?} | {text}"),
            None => log::debug!(target: "keyreel::script", "{pos:?} | {text}"),
        });

        object::register(&mut engine);
        register_queries(&mut engine, &caps.surface);
        register_timers(&mut engine, &caps.timers, &callbacks);

        Self {
            engine,
            ast: None,
            ran: false,
            callbacks,
        }
    }

    /// Compile and evaluate the project script. Only the first call does anything.
    ///
    /// Timers the script scheduled before a runtime error stay scheduled.
    pub fn run(&mut self, source: &str) -> Result<(), ScriptError> {
        if self.ran {
            return Err(ScriptError::AlreadyRan);
        }
        self.ran = true;
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| ScriptError::Compile(e.to_string()))?;
        let ast = self.ast.insert(ast);
        self.engine
            .run_ast(ast)
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }

    /// Run the callback registered as `id`.
    pub fn invoke(&self, id: CallbackId) -> Result<(), ScriptError> {
        let Some(ast) = self.ast.as_ref() else {
            return Err(ScriptError::UnknownCallback(id));
        };
        let callback = self
            .callbacks
            .borrow_mut()
            .checkout(id)
            .ok_or(ScriptError::UnknownCallback(id))?;
        callback
            .call::<Dynamic>(&self.engine, ast, ())
            .map(|_| ())
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }

    /// Drop every pending callback. Returns how many were dropped.
    pub fn forget_callbacks(&self) -> usize {
        let mut table = self.callbacks.borrow_mut();
        let n = table.entries.len();
        table.entries.clear();
        n
    }
}

fn to_script_objects(
    found: Vec<&SceneObject>,
    surface: &Rc<RefCell<dyn RenderSurface>>,
) -> Array {
    found
        .into_iter()
        .map(|o| Dynamic::from(ScriptObject::new(o.clone(), surface.clone())))
        .collect()
}

fn register_queries(engine: &mut Engine, surface: &Rc<RefCell<dyn RenderSurface>>) {
    let s = surface.clone();
    engine.register_fn("get_object_by_id", move |id: Dynamic| -> Dynamic {
        let Some(id) = convert::string_arg(&id) else {
            return Dynamic::UNIT;
        };
        let objects = s.borrow().objects();
        ObjectQuery::new(&objects)
            .by_id(&id)
            .map(|o| Dynamic::from(ScriptObject::new(o.clone(), s.clone())))
            .unwrap_or(Dynamic::UNIT)
    });

    let s = surface.clone();
    engine.register_fn("get_objects_by_ids", move |ids: Dynamic| -> Array {
        let Some(ids) = convert::string_list(&ids) else {
            return Array::new();
        };
        let objects = s.borrow().objects();
        to_script_objects(ObjectQuery::new(&objects).by_ids(&ids), &s)
    });

    let s = surface.clone();
    engine.register_fn("get_objects_by_class", move |name: Dynamic| -> Array {
        let Some(name) = convert::string_arg(&name) else {
            return Array::new();
        };
        let objects = s.borrow().objects();
        to_script_objects(ObjectQuery::new(&objects).by_class(&name), &s)
    });

    let s = surface.clone();
    engine.register_fn("get_objects_by_classes", move |names: Dynamic| -> Array {
        let Some(names) = convert::string_list(&names) else {
            return Array::new();
        };
        let objects = s.borrow().objects();
        to_script_objects(ObjectQuery::new(&objects).by_any_class(&names), &s)
    });

    let s = surface.clone();
    engine.register_fn("get_objects_by_all_classes", move |names: Dynamic| -> Array {
        let Some(names) = convert::string_list(&names) else {
            return Array::new();
        };
        let objects = s.borrow().objects();
        to_script_objects(ObjectQuery::new(&objects).by_all_classes(&names), &s)
    });
}

fn schedule_callback(
    timers: &RefCell<TimerRegistry>,
    table: &RefCell<CallbackTable>,
    kind: TimerKind,
    callback: FnPtr,
    delay: &Dynamic,
) -> INT {
    let id = table.borrow_mut().ids.alloc_callback();
    let handle =
        timers
            .borrow_mut()
            .schedule_tracked(kind, convert::delay_ms(delay), TimerTask::Script(id));
    table.borrow_mut().entries.insert(
        id,
        ScriptCallback {
            callback,
            kind,
            handle,
        },
    );
    handle.0 as INT
}

fn register_timers(
    engine: &mut Engine,
    timers: &Rc<RefCell<TimerRegistry>>,
    callbacks: &Rc<RefCell<CallbackTable>>,
) {
    let (t, c) = (timers.clone(), callbacks.clone());
    engine.register_fn("set_timeout", move |callback: FnPtr, delay: Dynamic| {
        schedule_callback(&t, &c, TimerKind::Once, callback, &delay)
    });

    let (t, c) = (timers.clone(), callbacks.clone());
    engine.register_fn("set_interval", move |callback: FnPtr, delay: Dynamic| {
        schedule_callback(&t, &c, TimerKind::Periodic, callback, &delay)
    });

    // Only timers the script itself created can be cleared from a script.
    let (t, c) = (timers.clone(), callbacks.clone());
    engine.register_fn("clear_timer", move |handle: INT| -> bool {
        let Ok(raw) = u32::try_from(handle) else {
            return false;
        };
        let handle = TimerHandle(raw);
        let mut timers = t.borrow_mut();
        if !timers.is_tracked(handle) {
            return false;
        }
        timers.cancel(handle);
        c.borrow_mut().remove_handle(handle);
        true
    });
}
