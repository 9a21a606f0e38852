//! Property interpolation between two keyframes.
//!
//! Only the keys of the end keyframe are produced. A non-smooth end keyframe turns the
//! whole segment into a hard cut: start props until progress reaches 1, then end props.

pub mod functions;

use keyreel_api_core::PropertySet;

use crate::data::Keyframe;
use functions::blend_value;

/// Blend `start` towards `end` at `progress` in [0, 1].
pub fn interpolate(start: &Keyframe, end: &Keyframe, progress: f64) -> PropertySet {
    if !end.smooth {
        return if progress >= 1.0 {
            end.props.clone()
        } else {
            start.props.clone()
        };
    }
    interpolate_props(&start.props, &end.props, progress)
}

/// Smooth per-key blend of two property sets.
pub fn interpolate_props(start: &PropertySet, end: &PropertySet, progress: f64) -> PropertySet {
    let mut out = PropertySet::with_capacity(end.len());
    for (key, end_value) in end {
        if let Some(v) = blend_value(key, start.get(key), end_value, progress) {
            out.insert(key.clone(), v);
        }
    }
    out
}
