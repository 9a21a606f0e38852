//! Animation clock: playback state plus the self-rescheduling tick loop.
//!
//! The clock is the only writer of `current_frame` and the play/stop state. Each tick
//! advances one frame (wrapping to 1 after the last), resolves and applies every
//! animated object, requests a render, and only then schedules the next tick.

use serde::{Deserialize, Serialize};

use crate::data::AnimationLibrary;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ids::TimerHandle;
use crate::sampling::resolve;
use crate::scene::RenderSurface;
use crate::timers::{TimerRegistry, TimerTask};

const FALLBACK_FPS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Stopped,
    Playing,
}

/// Playback state of a session. `1 <= current_frame <= total_frames` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// False once the session is torn down; an inactive clock refuses to play.
    pub active: bool,
    pub state: ClockState,
    pub current_frame: u32,
    pub total_frames: u32,
    pub fps: f64,
}

impl PlaybackState {
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self.state, ClockState::Playing)
    }
}

/// A requested frame before coercion. Hosts pass whatever they were given;
/// the clock never rejects a seek.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FrameInput {
    /// Integer value of the request: floats truncate toward zero, strings use their
    /// leading integer. Anything unusable reads as frame 1.
    pub fn coerce(&self) -> i64 {
        let n = match self {
            FrameInput::Int(i) => Some(*i),
            FrameInput::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            FrameInput::Float(_) => None,
            FrameInput::Text(s) => leading_int(s),
        };
        n.unwrap_or(1)
    }
}

/// Leading optionally-signed decimal integer of `s`, ignoring leading whitespace.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

impl From<i64> for FrameInput {
    fn from(v: i64) -> Self {
        FrameInput::Int(v)
    }
}

impl From<i32> for FrameInput {
    fn from(v: i32) -> Self {
        FrameInput::Int(v as i64)
    }
}

impl From<u32> for FrameInput {
    fn from(v: u32) -> Self {
        FrameInput::Int(v as i64)
    }
}

impl From<f64> for FrameInput {
    fn from(v: f64) -> Self {
        FrameInput::Float(v)
    }
}

impl From<&str> for FrameInput {
    fn from(v: &str) -> Self {
        FrameInput::Text(v.to_string())
    }
}

impl From<String> for FrameInput {
    fn from(v: String) -> Self {
        FrameInput::Text(v)
    }
}

/// Where a resolved frame goes.
pub struct FrameTarget<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub diagnostics: &'a dyn Diagnostics,
}

#[derive(Debug)]
pub struct Clock {
    playback: PlaybackState,
    library: AnimationLibrary,
    pending_tick: Option<TimerHandle>,
}

impl Clock {
    pub fn new(total_frames: u32, fps: f64, library: AnimationLibrary) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            FALLBACK_FPS
        };
        Self {
            playback: PlaybackState {
                active: true,
                state: ClockState::Stopped,
                current_frame: 1,
                total_frames: total_frames.max(1),
                fps,
            },
            library,
            pending_tick: None,
        }
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn library(&self) -> &AnimationLibrary {
        &self.library
    }

    #[inline]
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.playback.fps
    }

    /// Clamp any requested frame into `[1, total_frames]`.
    pub fn clamp_frame(&self, input: &FrameInput) -> u32 {
        input.coerce().clamp(1, self.playback.total_frames as i64) as u32
    }

    /// Start playing. The first tick runs immediately. Returns false when already
    /// playing or inactive.
    pub fn play(&mut self, timers: &mut TimerRegistry, target: &mut FrameTarget<'_>) -> bool {
        if !self.playback.active || self.playback.is_playing() {
            return false;
        }
        self.playback.state = ClockState::Playing;
        self.tick(timers, target);
        true
    }

    /// Stop playing and cancel the pending tick. Returns whether the clock was playing.
    pub fn stop(&mut self, timers: &mut TimerRegistry) -> bool {
        let was_playing = self.playback.is_playing();
        self.playback.state = ClockState::Stopped;
        if let Some(handle) = self.pending_tick.take() {
            timers.cancel(handle);
        }
        was_playing
    }

    /// Stop for good.
    pub fn deactivate(&mut self, timers: &mut TimerRegistry) {
        self.stop(timers);
        self.playback.active = false;
    }

    /// Jump to a frame and apply it, in either state. Returns the frame actually shown.
    pub fn seek(&mut self, input: impl Into<FrameInput>, target: &mut FrameTarget<'_>) -> u32 {
        let frame = self.clamp_frame(&input.into());
        self.playback.current_frame = frame;
        self.apply_frame(frame, target);
        frame
    }

    /// A tick timer fired. Ticks that are no longer pending (stopped, or superseded by
    /// a stop/play pair) are ignored.
    pub fn on_tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut TimerRegistry,
        target: &mut FrameTarget<'_>,
    ) {
        if self.pending_tick != Some(handle) {
            log::debug!(target: "keyreel", "ignoring stale tick {handle:?}");
            return;
        }
        self.pending_tick = None;
        self.tick(timers, target);
    }

    fn tick(&mut self, timers: &mut TimerRegistry, target: &mut FrameTarget<'_>) {
        if !self.playback.is_playing() {
            return;
        }
        let current = self.playback.current_frame;
        let next = if current >= self.playback.total_frames {
            1
        } else {
            current + 1
        };
        self.seek(next, target);
        if self.playback.is_playing() {
            let handle = timers.schedule_untracked(self.frame_interval_ms(), TimerTask::Tick);
            self.pending_tick = Some(handle);
        }
    }

    /// Resolve and apply every animated object at `frame`, then request a render.
    /// A rejected property set is reported and the remaining objects still get theirs.
    fn apply_frame(&self, frame: u32, target: &mut FrameTarget<'_>) {
        let objects = target.surface.objects();
        for object in &objects {
            let Some(anim_id) = object.anim_id.as_deref() else {
                continue;
            };
            let Some(track) = self.library.get(anim_id) else {
                continue;
            };
            let Some(props) = resolve(track, frame) else {
                continue;
            };
            if let Err(err) = target.surface.apply(object.key, &props) {
                target.diagnostics.report(Diagnostic::property(
                    frame,
                    object.key,
                    format!("object '{anim_id}': {err}"),
                ));
            }
        }
        target.surface.request_render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_input_coercion_follows_leading_integer_rules() {
        assert_eq!(FrameInput::from("abc").coerce(), 1);
        assert_eq!(FrameInput::from("12abc").coerce(), 12);
        assert_eq!(FrameInput::from("  -3").coerce(), -3);
        assert_eq!(FrameInput::from("").coerce(), 1);
        assert_eq!(FrameInput::from(2.9).coerce(), 2);
        assert_eq!(FrameInput::from(f64::NAN).coerce(), 1);
        assert_eq!(FrameInput::from(7).coerce(), 7);
    }
}
