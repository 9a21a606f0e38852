use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use crate::value::{PropValue, PropertySet, Shadow, SHADOW_KEY};

/// Errors produced while reading property sets from scene JSON.
#[derive(Debug, Error, PartialEq)]
pub enum JsonError {
    #[error("property set must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Read a shadow object. A named component present with the wrong type (including
/// `null`) hands the object back untouched so it can stay opaque.
fn shadow_from_json(
    mut obj: Map<String, JsonValue>,
) -> Result<Shadow, Map<String, JsonValue>> {
    fn number(obj: &Map<String, JsonValue>, key: &str) -> Option<Option<f64>> {
        match obj.get(key) {
            None => Some(None),
            Some(v) => v.as_f64().map(Some),
        }
    }
    let color = match obj.get("color") {
        None => Some(None),
        Some(JsonValue::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    };
    let (Some(color), Some(blur), Some(offset_x), Some(offset_y)) = (
        color,
        number(&obj, "blur"),
        number(&obj, "offsetX"),
        number(&obj, "offsetY"),
    ) else {
        return Err(obj);
    };
    for key in ["color", "blur", "offsetX", "offsetY"] {
        obj.shift_remove(key);
    }
    Ok(Shadow {
        color,
        blur,
        offset_x,
        offset_y,
        extra: obj,
    })
}

/// Convert one plain JSON property value into a [`PropValue`].
///
/// The property name matters only for objects: an object stored under
/// [`SHADOW_KEY`] becomes a [`Shadow`] when its named fields have the expected
/// types, every other object is kept as [`PropValue::Opaque`].
pub fn prop_from_json(key: &str, value: JsonValue) -> PropValue {
    match value {
        JsonValue::Null => PropValue::Null,
        JsonValue::Bool(b) => PropValue::Bool(b),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => PropValue::Number(f),
            None => PropValue::Opaque(JsonValue::Number(n)),
        },
        JsonValue::String(s) => PropValue::Text(s),
        JsonValue::Array(items) => PropValue::Array(
            items
                .into_iter()
                .map(|item| prop_from_json("", item))
                .collect(),
        ),
        JsonValue::Object(obj) => {
            if key == SHADOW_KEY {
                match shadow_from_json(obj) {
                    Ok(shadow) => PropValue::Shadow(shadow),
                    Err(obj) => PropValue::Opaque(JsonValue::Object(obj)),
                }
            } else {
                PropValue::Opaque(JsonValue::Object(obj))
            }
        }
    }
}

/// JSON number for `n`. Whole numbers in the exactly representable range are
/// written as integers, the way a JS host would serialize them.
fn number_to_json(n: f64) -> JsonValue {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        return JsonValue::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn shadow_to_json(shadow: &Shadow) -> JsonValue {
    let mut obj = Map::new();
    if let Some(color) = &shadow.color {
        obj.insert("color".into(), JsonValue::String(color.clone()));
    }
    for (key, value) in [
        ("blur", shadow.blur),
        ("offsetX", shadow.offset_x),
        ("offsetY", shadow.offset_y),
    ] {
        if let Some(n) = value {
            obj.insert(key.into(), number_to_json(n));
        }
    }
    for (k, v) in &shadow.extra {
        obj.insert(k.clone(), v.clone());
    }
    JsonValue::Object(obj)
}

/// Convert a [`PropValue`] back into the plain JSON a rendering surface expects.
/// Non-finite numbers have no JSON form and become `null`.
pub fn prop_to_json(value: &PropValue) -> JsonValue {
    match value {
        PropValue::Number(n) => number_to_json(*n),
        PropValue::Shadow(shadow) => shadow_to_json(shadow),
        PropValue::Array(items) => JsonValue::Array(items.iter().map(prop_to_json).collect()),
        PropValue::Text(s) => JsonValue::String(s.clone()),
        PropValue::Bool(b) => JsonValue::Bool(*b),
        PropValue::Null => JsonValue::Null,
        PropValue::Opaque(raw) => raw.clone(),
    }
}

/// Read a whole property set (`{ "left": 10, "fill": "#f00", ... }`).
pub fn props_from_json(value: JsonValue) -> Result<PropertySet, JsonError> {
    match value {
        JsonValue::Object(obj) => Ok(obj
            .into_iter()
            .map(|(k, v)| {
                let prop = prop_from_json(&k, v);
                (k, prop)
            })
            .collect()),
        other => Err(JsonError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Write a property set as a plain JSON object.
pub fn props_to_json(props: &PropertySet) -> JsonValue {
    let mut obj = Map::new();
    for (k, v) in props {
        obj.insert(k.clone(), prop_to_json(v));
    }
    JsonValue::Object(obj)
}
