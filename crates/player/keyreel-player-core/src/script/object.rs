//! `SceneObject` handles given to scripts.
//!
//! A handle is a snapshot of the object's descriptor plus a way back to the surface.
//! Writes go through `RenderSurface::apply` exactly like frame application, so the
//! surface keeps the last word on which properties are accepted.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use keyreel_api_core::PropertySet;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, INT};

use super::convert::{dynamic_to_prop, map_to_props};
use crate::ids::ObjectKey;
use crate::scene::{RenderSurface, SceneObject};

#[derive(Clone)]
pub struct ScriptObject {
    descriptor: SceneObject,
    surface: Rc<RefCell<dyn RenderSurface>>,
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl ScriptObject {
    pub(crate) fn new(descriptor: SceneObject, surface: Rc<RefCell<dyn RenderSurface>>) -> Self {
        Self {
            descriptor,
            surface,
        }
    }

    pub fn descriptor(&self) -> &SceneObject {
        &self.descriptor
    }

    pub fn key(&self) -> ObjectKey {
        self.descriptor.key
    }

    fn apply(&self, props: &PropertySet) -> Result<(), Box<EvalAltResult>> {
        let mut surface = self.surface.borrow_mut();
        surface
            .apply(self.descriptor.key, props)
            .map_err(|e| format!("{self}: {e}"))?;
        surface.request_render();
        Ok(())
    }
}

impl fmt::Display for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.descriptor.custom_id, &self.descriptor.anim_id) {
            (Some(id), _) => write!(f, "SceneObject(#{id})"),
            (None, Some(anim)) => write!(f, "SceneObject(anim {anim})"),
            (None, None) => write!(f, "SceneObject({})", self.descriptor.key.0),
        }
    }
}

fn opt_string(v: &Option<String>) -> Dynamic {
    v.clone().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
}

pub(crate) fn register(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptObject>("SceneObject")
        .register_get("id", |o: &mut ScriptObject| opt_string(&o.descriptor.custom_id))
        .register_get("anim_id", |o: &mut ScriptObject| opt_string(&o.descriptor.anim_id))
        .register_get("key", |o: &mut ScriptObject| o.descriptor.key.0 as INT)
        .register_get("classes", |o: &mut ScriptObject| -> Array {
            o.descriptor
                .custom_classes
                .iter()
                .cloned()
                .map(Dynamic::from)
                .collect()
        })
        .register_fn("has_class", |o: &mut ScriptObject, name: ImmutableString| {
            o.descriptor.has_class(name.as_str())
        })
        .register_fn(
            "set",
            |o: &mut ScriptObject,
             name: ImmutableString,
             value: Dynamic|
             -> Result<(), Box<EvalAltResult>> {
                let prop = dynamic_to_prop(name.as_str(), &value)
                    .map_err(|e| format!("{o}: '{name}': {e}"))?;
                let mut props = PropertySet::new();
                props.insert(name.to_string(), prop);
                o.apply(&props)
            },
        )
        .register_fn(
            "set_props",
            |o: &mut ScriptObject, map: Map| -> Result<(), Box<EvalAltResult>> {
                let props = map_to_props(&map).map_err(|e| format!("{o}: {e}"))?;
                o.apply(&props)
            },
        )
        .register_fn("to_string", |o: &mut ScriptObject| o.to_string())
        .register_fn("to_debug", |o: &mut ScriptObject| o.to_string());
}
