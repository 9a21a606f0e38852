//! Conversions between script values and property values.

use keyreel_api_core::{prop_from_json, PropValue, PropertySet};
use rhai::{Array, Dynamic, Map};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use super::object::ScriptObject;

/// Plain JSON form of a script value. Object handles and functions have none.
pub(crate) fn dynamic_to_json(value: &Dynamic) -> Result<JsonValue, String> {
    let value = value.flatten_clone();
    if value.is_unit() {
        return Ok(JsonValue::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(JsonValue::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(JsonValue::Number(Number::from(i)));
    }
    if let Ok(f) = value.as_float() {
        return Ok(Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null));
    }
    if let Ok(c) = value.as_char() {
        return Ok(JsonValue::String(c.to_string()));
    }
    if value.is_string() {
        return value
            .into_string()
            .map(JsonValue::String)
            .map_err(|t| format!("unreadable string ({t})"));
    }
    if value.is::<ScriptObject>() {
        return Err("a scene object cannot be used as a property value".to_string());
    }
    let type_name = value.type_name();
    if let Some(items) = value.clone().try_cast::<Array>() {
        return items
            .iter()
            .map(dynamic_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array);
    }
    if let Some(map) = value.try_cast::<Map>() {
        let mut obj = JsonMap::new();
        for (k, v) in &map {
            obj.insert(k.to_string(), dynamic_to_json(v)?);
        }
        return Ok(JsonValue::Object(obj));
    }
    Err(format!("values of type '{type_name}' cannot be used as properties"))
}

pub(crate) fn dynamic_to_prop(name: &str, value: &Dynamic) -> Result<PropValue, String> {
    dynamic_to_json(value).map(|json| prop_from_json(name, json))
}

/// Property set from a script map. Script maps iterate in key order.
pub(crate) fn map_to_props(map: &Map) -> Result<PropertySet, String> {
    map.iter()
        .map(|(k, v)| {
            let name = k.to_string();
            let prop = dynamic_to_prop(&name, v).map_err(|e| format!("'{name}': {e}"))?;
            Ok((name, prop))
        })
        .collect()
}

/// Delay argument in milliseconds; anything that is not a number means "now".
pub(crate) fn delay_ms(value: &Dynamic) -> f64 {
    let value = value.flatten_clone();
    if let Ok(i) = value.as_int() {
        i as f64
    } else if let Ok(f) = value.as_float() {
        f
    } else {
        0.0
    }
}

/// Strings out of a script array, skipping anything else. Non-arrays yield nothing.
pub(crate) fn string_list(value: &Dynamic) -> Option<Vec<String>> {
    let items = value.flatten_clone().try_cast::<Array>()?;
    Some(
        items
            .into_iter()
            .filter_map(|item| item.flatten().into_string().ok())
            .collect(),
    )
}

/// A non-empty string argument, if that is what the script passed.
pub(crate) fn string_arg(value: &Dynamic) -> Option<String> {
    value
        .flatten_clone()
        .into_string()
        .ok()
        .filter(|s| !s.is_empty())
}
