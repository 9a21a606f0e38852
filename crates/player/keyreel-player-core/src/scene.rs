//! Scene objects as seen by the player, and the rendering surface contract.
//!
//! The surface owns object identity and lifetime. The player only ever sees
//! [`SceneObject`] descriptors and addresses objects by their [`ObjectKey`].

use keyreel_api_core::PropertySet;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::document::CanvasSettings;
use crate::ids::ObjectKey;

/// Descriptor of one object on the rendering surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub key: ObjectKey,
    /// Correlates the object with a track; objects without one are never animated.
    #[serde(default)]
    pub anim_id: Option<String>,
    /// Unique id for direct lookup.
    #[serde(default)]
    pub custom_id: Option<String>,
    /// Tag membership for group queries.
    #[serde(default)]
    pub custom_classes: Vec<String>,
}

impl SceneObject {
    pub fn new(key: ObjectKey) -> Self {
        Self {
            key,
            anim_id: None,
            custom_id: None,
            custom_classes: Vec::new(),
        }
    }

    pub fn with_anim_id(mut self, anim_id: impl Into<String>) -> Self {
        self.anim_id = Some(anim_id.into());
        self
    }

    pub fn with_custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn has_class(&self, name: &str) -> bool {
        self.custom_classes.iter().any(|c| c == name)
    }

    /// Read the descriptor fields of a serialized scene object. `animId` and
    /// `customId` may be strings or numbers; a numeric `key` overrides `fallback`.
    /// Returns `None` when `value` is not a JSON object.
    pub fn from_json(fallback: ObjectKey, value: &JsonValue) -> Option<Self> {
        let fields = value.as_object()?;
        let key = fields
            .get("key")
            .and_then(JsonValue::as_u64)
            .and_then(|k| u32::try_from(k).ok())
            .map(ObjectKey)
            .unwrap_or(fallback);
        let custom_classes = match fields.get("customClasses") {
            Some(JsonValue::Array(classes)) => classes
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Some(Self {
            key,
            anim_id: id_field(fields.get("animId")),
            custom_id: id_field(fields.get("customId")),
            custom_classes,
        })
    }
}

fn id_field(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Failures reported by a rendering surface.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SurfaceError {
    #[error("scene graph rejected: {0}")]
    SceneGraph(String),
    #[error("object {0:?} is not on the surface")]
    UnknownObject(ObjectKey),
    #[error("property '{name}' cannot be applied: {reason}")]
    Property { name: String, reason: String },
    #[error("surface host error: {0}")]
    Host(String),
}

/// The four operations the player needs from whatever draws the scene.
///
/// Surfaces whose scene loading completes asynchronously should return from
/// `load_scene` once loading has begun and let the host call `Session::start`
/// from the completion callback.
pub trait RenderSurface {
    /// Build the scene from its serialized graph.
    fn load_scene(&mut self, canvas: &CanvasSettings, graph: &JsonValue)
        -> Result<(), SurfaceError>;

    /// Current objects, in surface order.
    fn objects(&self) -> Vec<SceneObject>;

    /// Apply a property set to one object.
    fn apply(&mut self, object: ObjectKey, props: &PropertySet) -> Result<(), SurfaceError>;

    /// Ask for a redraw after a batch of applications.
    fn request_render(&mut self);
}
