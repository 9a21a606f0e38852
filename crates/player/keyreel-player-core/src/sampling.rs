//! Keyframe resolution for the sparse per-object tracks.
//!
//! Model:
//! - A keyframe at exactly the requested frame wins outright, unblended.
//! - Between two keyframes the props are interpolated with
//!   progress = (frame - prev) / (next - prev).
//! - Outside the keyed range the nearest keyframe is held (no extrapolation).
//!
//! API:
//! - resolve(&Track, frame) -> Option<Cow<PropertySet>>; None leaves the object untouched.

use std::borrow::Cow;

use keyreel_api_core::PropertySet;

use crate::data::Track;
use crate::interp::interpolate;

/// Resolve the properties of one track at `frame`.
pub fn resolve(track: &Track, frame: u32) -> Option<Cow<'_, PropertySet>> {
    if track.is_empty() {
        return None;
    }
    if let Some(exact) = track.get(frame) {
        return Some(Cow::Borrowed(&exact.props));
    }
    match (track.before(frame), track.after(frame)) {
        (Some(prev), Some(next)) => {
            let progress = (frame - prev.frame) as f64 / (next.frame - prev.frame) as f64;
            Some(Cow::Owned(interpolate(prev, next, progress)))
        }
        // Past the last keyframe: hold it.
        (Some(prev), None) => Some(Cow::Borrowed(&prev.props)),
        // Before the first keyframe: hold it.
        (None, Some(next)) => Some(Cow::Borrowed(&next.props)),
        (None, None) => None,
    }
}
