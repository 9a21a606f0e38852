//! Rendering surface backed by a JS object.
//!
//! The object must provide:
//! - `loadScene(canvas, graph)`
//! - `objects()` returning `[{ key?, animId?, customId?, customClasses? }]`
//! - `apply(key, props)`, which may throw to refuse a property set
//! - `requestRender()`

use js_sys::{Function, Reflect};
use keyreel_api_core::{props_to_json, PropertySet};
use keyreel_player_core::{CanvasSettings, ObjectKey, RenderSurface, SceneObject, SurfaceError};
use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_wasm_bindgen as swb;
use wasm_bindgen::{JsCast, JsValue};

pub(crate) struct JsSurface {
    host: JsValue,
}

pub(crate) fn js_error_text(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Ok(message) = Reflect::get(err, &JsValue::from_str("message")) {
        if let Some(s) = message.as_string() {
            return s;
        }
    }
    format!("{err:?}")
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, SurfaceError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| SurfaceError::Host(e.to_string()))
}

impl JsSurface {
    pub(crate) fn new(host: JsValue) -> Self {
        Self { host }
    }

    fn method(&self, name: &str) -> Result<Function, SurfaceError> {
        Reflect::get(&self.host, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| SurfaceError::Host(format!("surface has no '{name}' method")))
    }
}

impl RenderSurface for JsSurface {
    fn load_scene(
        &mut self,
        canvas: &CanvasSettings,
        graph: &JsonValue,
    ) -> Result<(), SurfaceError> {
        let load = self.method("loadScene")?;
        load.call2(&self.host, &to_js(canvas)?, &to_js(graph)?)
            .map(|_| ())
            .map_err(|e| SurfaceError::SceneGraph(js_error_text(&e)))
    }

    fn objects(&self) -> Vec<SceneObject> {
        let listed = match self.method("objects").and_then(|f| {
            f.call0(&self.host)
                .map_err(|e| SurfaceError::Host(js_error_text(&e)))
        }) {
            Ok(v) => v,
            Err(err) => {
                log::warn!(target: "keyreel", "objects() failed: {err}");
                return Vec::new();
            }
        };
        let raw: Vec<JsonValue> = match swb::from_value(listed) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!(target: "keyreel", "objects() returned an unreadable list: {err}");
                return Vec::new();
            }
        };
        raw.iter()
            .enumerate()
            .filter_map(|(i, v)| SceneObject::from_json(ObjectKey(i as u32), v))
            .collect()
    }

    fn apply(&mut self, object: ObjectKey, props: &PropertySet) -> Result<(), SurfaceError> {
        let apply = self.method("apply")?;
        let payload = to_js(&props_to_json(props))?;
        apply
            .call2(&self.host, &JsValue::from(object.0), &payload)
            .map(|_| ())
            .map_err(|e| SurfaceError::Host(js_error_text(&e)))
    }

    fn request_render(&mut self) {
        match self.method("requestRender") {
            Ok(render) => {
                if let Err(e) = render.call0(&self.host) {
                    log::warn!(target: "keyreel", "requestRender() threw: {}", js_error_text(&e));
                }
            }
            Err(err) => log::warn!(target: "keyreel", "{err}"),
        }
    }
}
