//! wasm-bindgen host for the keyreel player.
//!
//! ```js
//! const config = { startup: { autoplay: true } };
//! const player = new ScenePlayer(documentJson, surface, config, onDiagnostic);
//! player.load();
//! player.start();          // or from the surface's load-complete callback
//! player.seek(12);
//! player.stop();
//! player.stopScripts();    // on unload
//! ```

mod scheduler;
mod surface;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, JSON};
use keyreel_player_core::{
    Diagnostic, Diagnostics, FrameInput, PlayerConfig, SceneObject, Session, Severity,
};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use scheduler::{BrowserScheduler, SessionSlot};
use surface::{js_error_text, to_js, JsSurface};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Diagnostics to the browser console, and to an optional JS listener.
struct ConsoleDiagnostics {
    listener: Option<Function>,
}

impl Diagnostics for ConsoleDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        let text = JsValue::from_str(&format!("[keyreel] {}", diagnostic.message));
        match diagnostic.severity {
            Severity::Error => web_sys::console::error_1(&text),
            Severity::Warning => web_sys::console::warn_1(&text),
        }
        let Some(listener) = &self.listener else {
            return;
        };
        match to_js(&diagnostic) {
            Ok(payload) => {
                if let Err(e) = listener.call1(&JsValue::UNDEFINED, &payload) {
                    web_sys::console::error_1(&JsValue::from_str(&format!(
                        "[keyreel] diagnostic listener threw: {}",
                        js_error_text(&e)
                    )));
                }
            }
            Err(e) => web_sys::console::error_1(&JsValue::from_str(&e.to_string())),
        }
    }
}

fn document_text(document: JsValue) -> Result<String, JsError> {
    if let Some(s) = document.as_string() {
        return Ok(s);
    }
    if jsvalue_is_undefined_or_null(&document) {
        return Err(JsError::new("scene document is null/undefined"));
    }
    JSON::stringify(&document)
        .map_err(|e| {
            JsError::new(&format!(
                "scene document stringify error: {}",
                js_error_text(&e)
            ))
        })?
        .as_string()
        .ok_or_else(|| JsError::new("scene document stringify produced non-string"))
}

fn frame_input(v: &JsValue) -> FrameInput {
    if let Some(n) = v.as_f64() {
        FrameInput::Float(n)
    } else if let Some(s) = v.as_string() {
        FrameInput::Text(s)
    } else {
        FrameInput::Float(f64::NAN)
    }
}

fn string_list(v: &JsValue) -> Vec<String> {
    if !js_sys::Array::is_array(v) {
        return Vec::new();
    }
    js_sys::Array::from(v)
        .iter()
        .filter_map(|item| item.as_string())
        .collect()
}

fn objects_to_js(objects: &[SceneObject]) -> Result<JsValue, JsError> {
    to_js(objects).map_err(|e| JsError::new(&e.to_string()))
}

#[wasm_bindgen]
pub struct ScenePlayer {
    session: Rc<RefCell<Session>>,
}

impl ScenePlayer {
    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R, JsError> {
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| JsError::new("player is busy (called from inside a player callback)"))?;
        Ok(f(&mut session))
    }

    fn read_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Result<R, JsError> {
        let session = self
            .session
            .try_borrow()
            .map_err(|_| JsError::new("player is busy (called from inside a player callback)"))?;
        Ok(f(&session))
    }
}

#[wasm_bindgen]
impl ScenePlayer {
    /// Build a player for a scene document (JSON string or object).
    /// `config` is an optional partial `PlayerConfig`; `on_diagnostic` receives
    /// `{ severity, source, message, frame?, object? }` records.
    #[wasm_bindgen(constructor)]
    pub fn new(
        document: JsValue,
        surface: JsValue,
        config: JsValue,
        on_diagnostic: Option<Function>,
    ) -> Result<ScenePlayer, JsError> {
        console_error_panic_hook::set_once();
        // The page or an earlier player may have installed a logger already.
        let _ = console_log::init_with_level(log::Level::Info);

        let cfg: PlayerConfig = if jsvalue_is_undefined_or_null(&config) {
            PlayerConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let text = document_text(document)?;

        let slot: SessionSlot = Rc::new(RefCell::new(Weak::new()));
        let session = Session::from_json(
            &text,
            Rc::new(RefCell::new(JsSurface::new(surface))),
            Box::new(BrowserScheduler::new(slot.clone())),
            Rc::new(ConsoleDiagnostics {
                listener: on_diagnostic,
            }),
            cfg,
        )
        .map_err(|e| JsError::new(&e.to_string()))?;
        let session = Rc::new(RefCell::new(session));
        *slot.borrow_mut() = Rc::downgrade(&session);
        Ok(ScenePlayer { session })
    }

    /// Hand the scene graph to the surface.
    pub fn load(&self) -> Result<(), JsError> {
        self.with_session(|s| s.load())?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Run the startup sequence (script, autoplay) after the scene is loaded.
    pub fn start(&self) -> Result<(), JsError> {
        self.with_session(|s| s.start())?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn play(&self) -> Result<bool, JsError> {
        self.with_session(|s| s.play())
    }

    pub fn stop(&self) -> Result<bool, JsError> {
        self.with_session(|s| s.stop())
    }

    /// Show a frame; anything that is not a usable number shows frame 1.
    pub fn seek(&self, frame: JsValue) -> Result<u32, JsError> {
        let input = frame_input(&frame);
        self.with_session(|s| s.seek(input))
    }

    /// Cancel all script timers. Returns how many were cancelled.
    #[wasm_bindgen(js_name = stopScripts)]
    pub fn stop_scripts(&self) -> Result<u32, JsError> {
        self.with_session(|s| s.stop_scripts() as u32)
    }

    pub fn teardown(&self) -> Result<(), JsError> {
        self.with_session(|s| s.teardown())
    }

    #[wasm_bindgen(js_name = getObjectById)]
    pub fn get_object_by_id(&self, id: JsValue) -> Result<JsValue, JsError> {
        let Some(id) = id.as_string() else {
            return Ok(JsValue::NULL);
        };
        match self.read_session(|s| s.get_object_by_id(&id))? {
            Some(obj) => to_js(&obj).map_err(|e| JsError::new(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = getObjectsByIds)]
    pub fn get_objects_by_ids(&self, ids: JsValue) -> Result<JsValue, JsError> {
        let ids = string_list(&ids);
        objects_to_js(&self.read_session(|s| s.get_objects_by_ids(&ids))?)
    }

    #[wasm_bindgen(js_name = getObjectsByClass)]
    pub fn get_objects_by_class(&self, name: JsValue) -> Result<JsValue, JsError> {
        let name = name.as_string().unwrap_or_default();
        objects_to_js(&self.read_session(|s| s.get_objects_by_class(&name))?)
    }

    #[wasm_bindgen(js_name = getObjectsByClasses)]
    pub fn get_objects_by_classes(&self, names: JsValue) -> Result<JsValue, JsError> {
        let names = string_list(&names);
        objects_to_js(&self.read_session(|s| s.get_objects_by_classes(&names))?)
    }

    #[wasm_bindgen(js_name = getObjectsByAllClasses)]
    pub fn get_objects_by_all_classes(&self, names: JsValue) -> Result<JsValue, JsError> {
        let names = string_list(&names);
        objects_to_js(&self.read_session(|s| s.get_objects_by_all_classes(&names))?)
    }

    #[wasm_bindgen(getter, js_name = currentFrame)]
    pub fn current_frame(&self) -> Result<u32, JsError> {
        self.read_session(|s| s.current_frame())
    }

    #[wasm_bindgen(getter, js_name = totalFrames)]
    pub fn total_frames(&self) -> Result<u32, JsError> {
        self.read_session(|s| s.total_frames())
    }

    #[wasm_bindgen(getter)]
    pub fn fps(&self) -> Result<f64, JsError> {
        self.read_session(|s| s.fps())
    }

    #[wasm_bindgen(getter, js_name = isPlaying)]
    pub fn is_playing(&self) -> Result<bool, JsError> {
        self.read_session(|s| s.is_playing())
    }

    /// `{ active, state, currentFrame, totalFrames, fps }`
    pub fn playback(&self) -> Result<JsValue, JsError> {
        let state = self.read_session(|s| s.playback().clone())?;
        to_js(&state).map_err(|e| JsError::new(&e.to_string()))
    }
}

#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
