//! Session: owns everything one playback of a scene needs.
//!
//! Lifecycle: new -> load (surface builds the scene) -> start (script and autoplay per
//! `StartupCfg`) -> play/stop/seek as the host likes -> teardown.
//!
//! Methods:
//! - new, from_json, load, start, run_script
//! - play, stop, seek, dispatch (timer fired)
//! - stop_scripts, teardown
//! - get_object_by_id, get_objects_by_ids, get_objects_by_class, get_objects_by_classes,
//!   get_objects_by_all_classes
//! - current_frame, total_frames, fps, is_playing, playback

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::clock::{Clock, FrameInput, FrameTarget, PlaybackState};
use crate::config::PlayerConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::document::{CanvasSettings, SceneDocument};
use crate::error::PlayerError;
use crate::ids::TimerHandle;
use crate::query::ObjectQuery;
use crate::scene::{RenderSurface, SceneObject};
use crate::script::{Capabilities, ScriptError, ScriptSandbox};
use crate::timers::{Scheduler, TimerRegistry, TimerTask};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Loaded,
    Started,
    TornDown,
}

pub struct Session {
    cfg: PlayerConfig,
    canvas: CanvasSettings,
    scene_graph: JsonValue,
    project_script: Option<String>,
    warnings: Vec<String>,
    clock: Clock,
    surface: Rc<RefCell<dyn RenderSurface>>,
    timers: Rc<RefCell<TimerRegistry>>,
    sandbox: ScriptSandbox,
    diagnostics: Rc<dyn Diagnostics>,
    /// Deferred startup steps not yet fired.
    startup_timers: Vec<TimerHandle>,
    phase: Phase,
}

impl Session {
    pub fn new(
        document: SceneDocument,
        surface: Rc<RefCell<dyn RenderSurface>>,
        scheduler: Box<dyn Scheduler>,
        diagnostics: Rc<dyn Diagnostics>,
        cfg: PlayerConfig,
    ) -> Self {
        let timers = Rc::new(RefCell::new(TimerRegistry::new(scheduler)));
        let sandbox = ScriptSandbox::new(
            Capabilities {
                surface: surface.clone(),
                timers: timers.clone(),
            },
            &cfg.sandbox,
        );
        Self {
            clock: Clock::new(document.total_frames, document.fps, document.library),
            canvas: document.canvas,
            scene_graph: document.scene_graph,
            project_script: document.project_script,
            warnings: document.warnings,
            cfg,
            surface,
            timers,
            sandbox,
            diagnostics,
            startup_timers: Vec::new(),
            phase: Phase::Created,
        }
    }

    /// Parse a scene document and build a session for it. A malformed document is a
    /// load fault: reported, and returned.
    pub fn from_json(
        json: &str,
        surface: Rc<RefCell<dyn RenderSurface>>,
        scheduler: Box<dyn Scheduler>,
        diagnostics: Rc<dyn Diagnostics>,
        cfg: PlayerConfig,
    ) -> Result<Self, PlayerError> {
        match SceneDocument::from_json_str(json, &cfg) {
            Ok(document) => Ok(Self::new(document, surface, scheduler, diagnostics, cfg)),
            Err(err) => {
                diagnostics.report(Diagnostic::load(Severity::Error, err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Hand the scene graph to the surface.
    pub fn load(&mut self) -> Result<(), PlayerError> {
        match self.phase {
            Phase::Created => {}
            Phase::TornDown => return Err(PlayerError::TornDown),
            Phase::Loaded | Phase::Started => return Ok(()),
        }
        if let Err(err) = self
            .surface
            .borrow_mut()
            .load_scene(&self.canvas, &self.scene_graph)
        {
            self.diagnostics
                .report(Diagnostic::load(Severity::Error, err.to_string()));
            return Err(err.into());
        }
        for warning in &self.warnings {
            self.diagnostics
                .report(Diagnostic::load(Severity::Warning, warning.clone()));
        }
        self.phase = Phase::Loaded;
        log::debug!(
            target: "keyreel",
            "scene loaded: {} objects, {} tracks",
            self.surface.borrow().objects().len(),
            self.clock.library().len()
        );
        Ok(())
    }

    /// Run the startup sequence once the scene is loaded.
    pub fn start(&mut self) -> Result<(), PlayerError> {
        match self.phase {
            Phase::Loaded => {}
            Phase::Created => return Err(PlayerError::NotLoaded),
            Phase::TornDown => return Err(PlayerError::TornDown),
            Phase::Started => return Ok(()),
        }
        self.phase = Phase::Started;
        let startup = self.cfg.startup.clone();
        if startup.run_script {
            match startup.script_delay_ms {
                None => {
                    self.run_script();
                }
                Some(ms) => self.defer(ms, TimerTask::RunScript),
            }
        }
        if startup.autoplay {
            match startup.autoplay_delay_ms {
                None => {
                    self.play();
                }
                Some(ms) => self.defer(ms, TimerTask::AutoPlay),
            }
        }
        Ok(())
    }

    fn defer(&mut self, delay_ms: f64, task: TimerTask) {
        let handle = self.timers.borrow_mut().schedule_untracked(delay_ms, task);
        self.startup_timers.push(handle);
    }

    /// Evaluate the project script if there is one and it has not run yet.
    /// Returns true when the script ran to completion; faults go to diagnostics.
    pub fn run_script(&mut self) -> bool {
        if self.phase == Phase::TornDown {
            return false;
        }
        let Some(source) = self.project_script.as_deref() else {
            return false;
        };
        match self.sandbox.run(source) {
            Ok(()) => true,
            Err(ScriptError::AlreadyRan) => {
                log::debug!(target: "keyreel", "project script already ran; skipped");
                false
            }
            Err(err) => {
                self.diagnostics.report(Diagnostic::script(err.to_string()));
                false
            }
        }
    }

    fn with_frame_target<R>(
        &mut self,
        f: impl FnOnce(&mut Clock, &mut TimerRegistry, &mut FrameTarget<'_>) -> R,
    ) -> R {
        let mut surface = self.surface.borrow_mut();
        let mut timers = self.timers.borrow_mut();
        let mut target = FrameTarget {
            surface: &mut *surface,
            diagnostics: &*self.diagnostics,
        };
        f(&mut self.clock, &mut timers, &mut target)
    }

    /// Start playback. Returns false when already playing or torn down.
    pub fn play(&mut self) -> bool {
        self.with_frame_target(|clock, timers, target| clock.play(timers, target))
    }

    /// Stop playback. Script timers keep running; see [`Session::stop_scripts`].
    pub fn stop(&mut self) -> bool {
        let mut timers = self.timers.borrow_mut();
        self.clock.stop(&mut timers)
    }

    /// Show `frame` (clamped into range), playing or not. Returns the frame shown.
    pub fn seek(&mut self, frame: impl Into<FrameInput>) -> u32 {
        if self.phase == Phase::TornDown {
            return self.current_frame();
        }
        let frame = frame.into();
        self.with_frame_target(|clock, _, target| clock.seek(frame, target))
    }

    /// Entry point for the host scheduler: the timer `handle` carrying `task` fired.
    pub fn dispatch(&mut self, handle: TimerHandle, task: TimerTask) {
        if self.phase == Phase::TornDown {
            return;
        }
        match task {
            TimerTask::Tick => self.with_frame_target(|clock, timers, target| {
                clock.on_tick(handle, timers, target)
            }),
            TimerTask::RunScript => {
                self.startup_timers.retain(|h| *h != handle);
                self.run_script();
            }
            TimerTask::AutoPlay => {
                self.startup_timers.retain(|h| *h != handle);
                self.play();
            }
            TimerTask::Script(id) => {
                self.timers.borrow_mut().note_fired(handle);
                match self.sandbox.invoke(id) {
                    Ok(()) => {}
                    Err(ScriptError::UnknownCallback(id)) => {
                        log::debug!(
                            target: "keyreel",
                            "timer {handle:?} fired for dropped callback {id:?}"
                        );
                    }
                    Err(err) => self.diagnostics.report(Diagnostic::script(err.to_string())),
                }
            }
        }
    }

    /// Cancel every script timer and drop pending callbacks. Playback is unaffected.
    /// Returns how many timers were cancelled.
    pub fn stop_scripts(&mut self) -> usize {
        let cancelled = self.timers.borrow_mut().cancel_all();
        self.sandbox.forget_callbacks();
        cancelled
    }

    /// Stop playback, scripts and pending startup steps for good.
    pub fn teardown(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.stop_scripts();
        let mut timers = self.timers.borrow_mut();
        for handle in self.startup_timers.drain(..) {
            timers.cancel(handle);
        }
        self.clock.deactivate(&mut timers);
        drop(timers);
        self.phase = Phase::TornDown;
        log::debug!(target: "keyreel", "session torn down");
    }

    // ----- queries -----

    /// Snapshot of the surface's objects.
    pub fn objects(&self) -> Vec<SceneObject> {
        self.surface.borrow().objects()
    }

    pub fn get_object_by_id(&self, id: &str) -> Option<SceneObject> {
        let objects = self.objects();
        ObjectQuery::new(&objects).by_id(id).cloned()
    }

    pub fn get_objects_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<SceneObject> {
        let objects = self.objects();
        owned(ObjectQuery::new(&objects).by_ids(ids))
    }

    pub fn get_objects_by_class(&self, name: &str) -> Vec<SceneObject> {
        let objects = self.objects();
        owned(ObjectQuery::new(&objects).by_class(name))
    }

    pub fn get_objects_by_classes<S: AsRef<str>>(&self, names: &[S]) -> Vec<SceneObject> {
        let objects = self.objects();
        owned(ObjectQuery::new(&objects).by_any_class(names))
    }

    pub fn get_objects_by_all_classes<S: AsRef<str>>(&self, names: &[S]) -> Vec<SceneObject> {
        let objects = self.objects();
        owned(ObjectQuery::new(&objects).by_all_classes(names))
    }

    // ----- state -----

    pub fn playback(&self) -> &PlaybackState {
        self.clock.playback()
    }

    pub fn current_frame(&self) -> u32 {
        self.clock.playback().current_frame
    }

    pub fn total_frames(&self) -> u32 {
        self.clock.playback().total_frames
    }

    pub fn fps(&self) -> f64 {
        self.clock.playback().fps
    }

    pub fn is_playing(&self) -> bool {
        self.clock.playback().is_playing()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.cfg
    }

    pub fn has_script(&self) -> bool {
        self.project_script.is_some()
    }

    /// Script timers currently recorded.
    pub fn script_timer_count(&self) -> usize {
        self.timers.borrow().tracked_len()
    }
}

fn owned(found: Vec<&SceneObject>) -> Vec<SceneObject> {
    found.into_iter().cloned().collect()
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
