//! PropValue: typed property values carried by keyframes and applied to scene objects.
//! All numeric values use f64 so authored numbers survive a round trip unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property name reserved for the shadow composite. Only values stored under this
/// key get the component-wise shadow blend.
pub const SHADOW_KEY: &str = "shadow";

/// Ordered property mapping. Insertion order is the authored order and is the order
/// in which properties reach the rendering surface.
pub type PropertySet = IndexMap<String, PropValue>;

/// Lightweight kind enum for dispatch and diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    Number,
    Shadow,
    Array,
    Text,
    Bool,
    Null,
    Opaque,
}

impl PropKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropKind::Number => "number",
            PropKind::Shadow => "shadow",
            PropKind::Array => "array",
            PropKind::Text => "text",
            PropKind::Bool => "bool",
            PropKind::Null => "null",
            PropKind::Opaque => "opaque",
        }
    }
}

/// Shadow descriptor `{ color, blur, offsetX, offsetY, ... }`.
///
/// Only the four named components take part in blending. Absent components stay
/// absent and any other fields ride along in `extra`, so a shadow read from a
/// document writes back exactly as authored.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Shadow {
    pub fn new(color: impl Into<String>, blur: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            color: Some(color.into()),
            blur: Some(blur),
            offset_x: Some(offset_x),
            offset_y: Some(offset_y),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PropValue {
    /// Scalar number (linear blend)
    Number(f64),

    /// Shadow composite (blur/offsets blend, color steps)
    Shadow(Shadow),

    /// Mixed array; numeric elements blend pairwise when lengths match
    Array(Vec<PropValue>),

    /// Text, including color strings (step)
    Text(String),

    /// Boolean (step)
    Bool(bool),

    /// Explicit null (step)
    Null,

    /// Any other JSON structure, carried through untouched (step)
    Opaque(serde_json::Value),
}

impl PropValue {
    #[inline]
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::Number(_) => PropKind::Number,
            PropValue::Shadow(_) => PropKind::Shadow,
            PropValue::Array(_) => PropKind::Array,
            PropValue::Text(_) => PropKind::Text,
            PropValue::Bool(_) => PropKind::Bool,
            PropValue::Null => PropKind::Null,
            PropValue::Opaque(_) => PropKind::Opaque,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn num(v: f64) -> Self {
        PropValue::Number(v)
    }

    pub fn text(s: impl Into<String>) -> Self {
        PropValue::Text(s.into())
    }

    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropValue>,
    {
        PropValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Number(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Number(v as f64)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Text(v)
    }
}

impl From<Shadow> for PropValue {
    fn from(v: Shadow) -> Self {
        PropValue::Shadow(v)
    }
}

/// Build a [`PropertySet`] from `(name, value)` pairs, keeping their order.
pub fn props<I, K, V>(pairs: I) -> PropertySet
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
