//! Keyframe data model: keyframes, sparse per-object tracks and the animation library.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use keyreel_api_core::PropertySet;
use serde::{Deserialize, Serialize};

/// An authored snapshot of an object's properties pinned to a frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub props: PropertySet,
    /// When false, the segment arriving at this keyframe is a hard cut.
    #[serde(default = "default_smooth")]
    pub smooth: bool,
}

fn default_smooth() -> bool {
    true
}

impl Keyframe {
    pub fn new(frame: u32, props: PropertySet) -> Self {
        Self {
            frame,
            props,
            smooth: true,
        }
    }

    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}

/// Sparse frame -> keyframe mapping for one animated object.
/// One keyframe per frame; inserting at an occupied frame replaces the old one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    keyframes: BTreeMap<u32, Keyframe>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe, returning the one it replaced (last write wins).
    pub fn insert(&mut self, keyframe: Keyframe) -> Option<Keyframe> {
        self.keyframes.insert(keyframe.frame, keyframe)
    }

    #[inline]
    pub fn get(&self, frame: u32) -> Option<&Keyframe> {
        self.keyframes.get(&frame)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Keyframe frame numbers in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = u32> + '_ {
        self.keyframes.keys().copied()
    }

    /// Greatest keyframe strictly before `frame`.
    pub fn before(&self, frame: u32) -> Option<&Keyframe> {
        self.keyframes.range(..frame).next_back().map(|(_, k)| k)
    }

    /// Smallest keyframe strictly after `frame`.
    pub fn after(&self, frame: u32) -> Option<&Keyframe> {
        let start = frame.checked_add(1)?;
        self.keyframes.range(start..).next().map(|(_, k)| k)
    }
}

impl FromIterator<Keyframe> for Track {
    fn from_iter<I: IntoIterator<Item = Keyframe>>(iter: I) -> Self {
        let mut track = Track::new();
        for kf in iter {
            track.insert(kf);
        }
        track
    }
}

/// Tracks keyed by the `animId` carried on scene objects.
#[derive(Clone, Debug, Default)]
pub struct AnimationLibrary {
    tracks: HashMap<String, Track>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, anim_id: impl Into<String>, track: Track) -> Option<Track> {
        self.tracks.insert(anim_id.into(), track)
    }

    pub fn get(&self, anim_id: &str) -> Option<&Track> {
        self.tracks.get(anim_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyreel_api_core::props;

    #[test]
    fn last_insert_at_a_frame_wins() {
        let mut track = Track::new();
        track.insert(Keyframe::new(5, props([("x", 1.0)])));
        let replaced = track.insert(Keyframe::new(5, props([("x", 2.0)])));
        assert!(replaced.is_some());
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(5).unwrap().props["x"].as_number(), Some(2.0));
    }

    #[test]
    fn neighbours_are_strict() {
        let track: Track = [1, 5, 9]
            .into_iter()
            .map(|f| Keyframe::new(f, PropertySet::new()))
            .collect();
        assert_eq!(track.before(5).map(|k| k.frame), Some(1));
        assert_eq!(track.after(5).map(|k| k.frame), Some(9));
        assert_eq!(track.before(1).map(|k| k.frame), None);
        assert_eq!(track.after(9).map(|k| k.frame), None);
        assert_eq!(track.after(u32::MAX).map(|k| k.frame), None);
    }
}
