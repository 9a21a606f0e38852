//! Interpolation helpers:
//! - lerp (numbers)
//! - step (discrete pick with strict `> 0.5` threshold)
//! - shadow blend (blur/offsets linear, color and extra fields step)
//! - array blend (element-wise, equal lengths only)

use keyreel_api_core::{PropValue, Shadow, SHADOW_KEY};

/// Progress above which discrete values switch to the end side.
/// Exactly 0.5 still picks the start value.
pub const STEP_THRESHOLD: f64 = 0.5;

/// Linear interpolation of numbers.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Step semantics: `end` once progress is strictly past the threshold.
#[inline]
pub fn step<'a, T: ?Sized>(start: &'a T, end: &'a T, t: f64) -> &'a T {
    if t > STEP_THRESHOLD {
        end
    } else {
        start
    }
}

/// A shadow component present on only one side steps.
#[inline]
fn blend_component(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        _ => *step(&a, &b, t),
    }
}

/// Blur and offsets blend, color steps. Fields outside those four step as a whole.
pub fn blend_shadow(a: &Shadow, b: &Shadow, t: f64) -> Shadow {
    Shadow {
        color: step(&a.color, &b.color, t).clone(),
        blur: blend_component(a.blur, b.blur, t),
        offset_x: blend_component(a.offset_x, b.offset_x, t),
        offset_y: blend_component(a.offset_y, b.offset_y, t),
        extra: step(&a.extra, &b.extra, t).clone(),
    }
}

/// Element-wise blend of two arrays of equal length. Numeric pairs are
/// interpolated; every other pair steps.
pub fn blend_array(a: &[PropValue], b: &[PropValue], t: f64) -> Vec<PropValue> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(sa, eb)| match (sa, eb) {
            (PropValue::Number(x), PropValue::Number(y)) => PropValue::Number(lerp(*x, *y, t)),
            _ => step(sa, eb, t).clone(),
        })
        .collect()
}

/// Blend one property. `start` is `None` when the start keyframe lacks the key;
/// the result is then `None` below the threshold (nothing to write).
pub fn blend_value(
    key: &str,
    start: Option<&PropValue>,
    end: &PropValue,
    t: f64,
) -> Option<PropValue> {
    let Some(start) = start else {
        return (t > STEP_THRESHOLD).then(|| end.clone());
    };
    let blended = match (start, end) {
        (PropValue::Number(a), PropValue::Number(b)) => PropValue::Number(lerp(*a, *b, t)),
        (PropValue::Shadow(a), PropValue::Shadow(b)) if key == SHADOW_KEY => {
            PropValue::Shadow(blend_shadow(a, b, t))
        }
        (PropValue::Array(a), PropValue::Array(b)) if a.len() == b.len() => {
            PropValue::Array(blend_array(a, b, t))
        }
        _ => step(start, end, t).clone(),
    };
    Some(blended)
}
