//! keyreel-api-core: property values exchanged between keyframes, the interpolator
//! and the rendering surface (engine-agnostic).

pub mod json;
pub mod value;

pub use json::{prop_from_json, prop_to_json, props_from_json, props_to_json, JsonError};
pub use value::{props, PropKind, PropValue, PropertySet, Shadow, SHADOW_KEY};
