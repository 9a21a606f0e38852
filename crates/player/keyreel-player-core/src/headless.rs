//! Headless host: an in-memory rendering surface and a virtual-time scheduler.
//!
//! Used by tests, benches and tooling that need to drive a session without a browser.
//! `ManualScheduler::advance` fires due timers in (due time, creation order) and hands
//! each one to `Session::dispatch`, so playback runs deterministically.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use keyreel_api_core::{prop_from_json, PropValue, PropertySet};
use serde_json::Value as JsonValue;

use crate::config::PlayerConfig;
use crate::diagnostics::DiagnosticLog;
use crate::document::CanvasSettings;
use crate::error::PlayerError;
use crate::ids::{IdAllocator, ObjectKey, TimerHandle};
use crate::scene::{RenderSurface, SceneObject, SurfaceError};
use crate::session::Session;
use crate::timers::{Scheduler, TimerKind, TimerTask};

/// Descriptor fields; the surface owns them and refuses to have them set.
const DESCRIPTOR_FIELDS: [&str; 4] = ["type", "animId", "customId", "customClasses"];

#[derive(Clone, Debug)]
struct HeadlessObject {
    descriptor: SceneObject,
    props: PropertySet,
}

/// Rendering surface that keeps objects as property sets.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    canvas: Option<CanvasSettings>,
    objects: Vec<HeadlessObject>,
    rejected: HashSet<String>,
    render_requests: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `apply` refuse any property set containing `name`.
    pub fn reject_property(&mut self, name: impl Into<String>) {
        self.rejected.insert(name.into());
    }

    /// Add an object directly; returns its key.
    pub fn add_object(
        &mut self,
        anim_id: Option<&str>,
        custom_id: Option<&str>,
        classes: &[&str],
        props: PropertySet,
    ) -> ObjectKey {
        let key = ObjectKey(self.objects.len() as u32);
        let mut descriptor = SceneObject::new(key).with_classes(classes.iter().copied());
        descriptor.anim_id = anim_id.map(str::to_string);
        descriptor.custom_id = custom_id.map(str::to_string);
        self.objects.push(HeadlessObject { descriptor, props });
        key
    }

    pub fn canvas(&self) -> Option<&CanvasSettings> {
        self.canvas.as_ref()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn render_requests(&self) -> usize {
        self.render_requests
    }

    pub fn props(&self, key: ObjectKey) -> Option<&PropertySet> {
        self.objects.get(key.0 as usize).map(|o| &o.props)
    }

    pub fn prop(&self, key: ObjectKey, name: &str) -> Option<&PropValue> {
        self.props(key)?.get(name)
    }

    pub fn find_by_custom_id(&self, id: &str) -> Option<ObjectKey> {
        self.objects
            .iter()
            .find(|o| o.descriptor.custom_id.as_deref() == Some(id))
            .map(|o| o.descriptor.key)
    }
}

fn graph_objects(graph: &JsonValue) -> Result<&[JsonValue], SurfaceError> {
    match graph {
        JsonValue::Null => Ok(&[]),
        JsonValue::Array(items) => Ok(items),
        JsonValue::Object(map) => match map.get("objects") {
            None | Some(JsonValue::Null) => Ok(&[]),
            Some(JsonValue::Array(items)) => Ok(items),
            Some(_) => Err(SurfaceError::SceneGraph("'objects' must be an array".into())),
        },
        _ => Err(SurfaceError::SceneGraph(
            "scene graph must be an object or an array".into(),
        )),
    }
}

fn read_object(index: usize, raw: &JsonValue) -> Result<HeadlessObject, SurfaceError> {
    let key = ObjectKey(index as u32);
    let (Some(mut descriptor), JsonValue::Object(fields)) = (SceneObject::from_json(key, raw), raw)
    else {
        return Err(SurfaceError::SceneGraph(format!(
            "object {index} is not a JSON object"
        )));
    };
    // Keys are positions on this surface.
    descriptor.key = key;
    let props = fields
        .iter()
        .filter(|(k, _)| !DESCRIPTOR_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), prop_from_json(k, v.clone())))
        .collect();
    Ok(HeadlessObject { descriptor, props })
}

impl RenderSurface for HeadlessSurface {
    fn load_scene(
        &mut self,
        canvas: &CanvasSettings,
        graph: &JsonValue,
    ) -> Result<(), SurfaceError> {
        let objects = graph_objects(graph)?
            .iter()
            .enumerate()
            .map(|(i, raw)| read_object(i, raw))
            .collect::<Result<Vec<_>, _>>()?;
        self.canvas = Some(canvas.clone());
        self.objects = objects;
        Ok(())
    }

    fn objects(&self) -> Vec<SceneObject> {
        self.objects.iter().map(|o| o.descriptor.clone()).collect()
    }

    /// All or nothing: one refused property leaves the object untouched.
    fn apply(&mut self, object: ObjectKey, props: &PropertySet) -> Result<(), SurfaceError> {
        if let Some(name) = props.keys().find(|k| DESCRIPTOR_FIELDS.contains(&k.as_str())) {
            return Err(SurfaceError::Property {
                name: name.clone(),
                reason: "read-only descriptor field".into(),
            });
        }
        if let Some(name) = props.keys().find(|k| self.rejected.contains(k.as_str())) {
            return Err(SurfaceError::Property {
                name: name.clone(),
                reason: "not supported by this surface".into(),
            });
        }
        let target = self
            .objects
            .get_mut(object.0 as usize)
            .ok_or(SurfaceError::UnknownObject(object))?;
        for (name, value) in props {
            target.props.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }
}

#[derive(Clone, Debug)]
struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
    interval_ms: f64,
    due_ms: f64,
    seq: u64,
    task: TimerTask,
}

#[derive(Debug, Default)]
struct Timeline {
    now_ms: f64,
    seq: u64,
    ids: IdAllocator,
    pending: Vec<PendingTimer>,
}

impl Timeline {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Upper bound on timers fired by one [`ManualScheduler::advance`] call.
pub const MAX_FIRINGS_PER_ADVANCE: usize = 10_000;

/// Virtual-time scheduler. Clones share one timeline, so the host keeps a clone to
/// drive time while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    timeline: Rc<RefCell<Timeline>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.timeline.borrow().now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.timeline.borrow().pending.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timeline
            .borrow()
            .pending
            .iter()
            .any(|p| p.handle == handle)
    }

    /// Fire every timer due within the next `ms` milliseconds, then move the clock to
    /// the end of the window. Returns how many timers fired.
    ///
    /// A callback that keeps re-arming itself with no delay never lets the window
    /// drain, so at most [`MAX_FIRINGS_PER_ADVANCE`] timers fire per call. When the
    /// cap is hit the clock stays at the last firing and the rest stay pending.
    pub fn advance(&self, session: &mut Session, ms: f64) -> usize {
        let until = self.now() + ms.max(0.0);
        let mut fired = 0;
        while fired < MAX_FIRINGS_PER_ADVANCE {
            let Some((handle, task)) = self.pop_due(until) else {
                let mut timeline = self.timeline.borrow_mut();
                timeline.now_ms = timeline.now_ms.max(until);
                return fired;
            };
            session.dispatch(handle, task);
            fired += 1;
        }
        log::warn!(
            target: "keyreel",
            "fired {fired} timers without draining the window; stopped at {} ms",
            self.now()
        );
        fired
    }

    fn pop_due(&self, until: f64) -> Option<(TimerHandle, TimerTask)> {
        let mut timeline = self.timeline.borrow_mut();
        let index = timeline
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= until)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        let kind = timeline.pending[index].kind;
        let timer = match kind {
            TimerKind::Once => timeline.pending.remove(index),
            TimerKind::Periodic => {
                let seq = timeline.next_seq();
                let entry = &mut timeline.pending[index];
                let fired = entry.clone();
                entry.due_ms += entry.interval_ms;
                entry.seq = seq;
                fired
            }
        };
        timeline.now_ms = timeline.now_ms.max(timer.due_ms);
        Some((timer.handle, timer.task))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64, task: TimerTask) -> TimerHandle {
        let mut timeline = self.timeline.borrow_mut();
        let handle = timeline.ids.alloc_timer();
        let seq = timeline.next_seq();
        // A periodic timer with no interval would never let time move.
        let interval_ms = match kind {
            TimerKind::Once => delay_ms,
            TimerKind::Periodic => delay_ms.max(1.0),
        };
        let due_ms = timeline.now_ms + interval_ms;
        timeline.pending.push(PendingTimer {
            handle,
            kind,
            interval_ms,
            due_ms,
            seq,
            task,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timeline
            .borrow_mut()
            .pending
            .retain(|p| p.handle != handle);
    }
}

/// A session wired to a headless surface, a manual scheduler and a retaining
/// diagnostics log.
pub struct HeadlessPlayer {
    pub session: Session,
    pub surface: Rc<RefCell<HeadlessSurface>>,
    pub scheduler: ManualScheduler,
    pub diagnostics: Rc<DiagnosticLog>,
}

impl HeadlessPlayer {
    /// Parse and load a scene document. The session is not started.
    pub fn load(json: &str, cfg: PlayerConfig) -> Result<Self, PlayerError> {
        let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
        let scheduler = ManualScheduler::new();
        let diagnostics = Rc::new(DiagnosticLog::new(cfg.diagnostics.clone()));
        let mut session = Session::from_json(
            json,
            surface.clone(),
            Box::new(scheduler.clone()),
            diagnostics.clone(),
            cfg,
        )?;
        session.load()?;
        Ok(Self {
            session,
            surface,
            scheduler,
            diagnostics,
        })
    }

    /// Load and start.
    pub fn start(json: &str, cfg: PlayerConfig) -> Result<Self, PlayerError> {
        let mut player = Self::load(json, cfg)?;
        player.session.start()?;
        Ok(player)
    }

    pub fn advance(&mut self, ms: f64) -> usize {
        self.scheduler.advance(&mut self.session, ms)
    }

    /// Property `name` of the object whose `customId` is `id`.
    pub fn prop_of(&self, id: &str, name: &str) -> Option<PropValue> {
        let surface = self.surface.borrow();
        let key = surface.find_by_custom_id(id)?;
        surface.prop(key, name).cloned()
    }
}
