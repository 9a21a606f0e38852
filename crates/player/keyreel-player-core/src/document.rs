//! Scene document parsing.
//!
//! The document is the JSON blob an authoring tool exports:
//! `{ canvasWidth, canvasHeight, canvasBackground, canvas, animation, projectScript }`.
//!
//! Notes:
//! - Missing or zero canvas/animation settings fall back to `PlayerConfig` defaults.
//! - `canvas` (the serialized scene graph) may be an object or a JSON string.
//! - Track keys are frame numbers as strings; entries that are not usable (non-numeric
//!   keys, non-object keyframes or props) are skipped and reported as warnings.
//! - A keyframe is smooth unless it carries `smooth: false` literally.
//! - Keys repeated within a track resolve in document order, last one wins.

use indexmap::IndexMap;
use keyreel_api_core::props_from_json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::PlayerConfig;
use crate::data::{AnimationLibrary, Keyframe, Track};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("scene document parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scene graph string is not valid JSON: {0}")]
    SceneGraph(serde_json::Error),
}

/// Canvas dimensions and background passed to the surface on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

/// Parsed scene document.
#[derive(Clone, Debug)]
pub struct SceneDocument {
    pub canvas: CanvasSettings,
    pub scene_graph: JsonValue,
    pub total_frames: u32,
    pub fps: f64,
    pub library: AnimationLibrary,
    pub project_script: Option<String>,
    /// Entries skipped while reading the animation section.
    pub warnings: Vec<String>,
}

impl SceneDocument {
    pub fn from_json_str(s: &str, cfg: &PlayerConfig) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_str(s)?;
        Self::from_raw(raw, cfg)
    }

    pub fn from_json_value(value: JsonValue, cfg: &PlayerConfig) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_value(value)?;
        Self::from_raw(raw, cfg)
    }

    fn from_raw(raw: RawDocument, cfg: &PlayerConfig) -> Result<Self, DocumentError> {
        let canvas = CanvasSettings {
            width: positive_u32(number(raw.canvas_width)).unwrap_or(cfg.default_canvas_width),
            height: positive_u32(number(raw.canvas_height)).unwrap_or(cfg.default_canvas_height),
            background: raw
                .canvas_background
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| cfg.default_canvas_background.clone()),
        };

        let scene_graph = match raw.canvas {
            JsonValue::String(s) => serde_json::from_str(&s).map_err(DocumentError::SceneGraph)?,
            other => other,
        };

        let mut warnings = Vec::new();
        let (total_frames, fps, library) = match raw.animation {
            Some(anim) => (
                positive_u32(number(anim.total_frames)).unwrap_or(cfg.default_total_frames),
                number(anim.fps)
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .unwrap_or(cfg.default_fps),
                read_library(anim.data.unwrap_or_default(), &mut warnings),
            ),
            None => (
                cfg.default_total_frames,
                cfg.default_fps,
                AnimationLibrary::new(),
            ),
        };

        let project_script = raw.project_script.filter(|s| !s.trim().is_empty());

        Ok(SceneDocument {
            canvas,
            scene_graph,
            total_frames: total_frames.max(1),
            fps,
            library,
            project_script,
            warnings,
        })
    }
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(v: Option<JsonValue>) -> Option<f64> {
    match v? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Truncate a JSON number to a positive u32, treating 0 / negatives / NaN as absent.
fn positive_u32(v: Option<f64>) -> Option<u32> {
    let v = v?;
    if !v.is_finite() || v < 1.0 {
        return None;
    }
    Some(v.min(u32::MAX as f64) as u32)
}

fn read_library(data: IndexMap<String, RawTrack>, warnings: &mut Vec<String>) -> AnimationLibrary {
    let mut library = AnimationLibrary::new();
    for (anim_id, raw_track) in data {
        let entries = match raw_track {
            RawTrack::Keyed(entries) => entries,
            RawTrack::Other(found) => {
                warnings.push(format!(
                    "track '{anim_id}' is not an object (found {found}); skipped"
                ));
                continue;
            }
        };
        let mut track = Track::new();
        for (frame_key, raw_kf) in entries {
            let Ok(frame) = frame_key.trim().parse::<u32>() else {
                warnings.push(format!(
                    "track '{anim_id}': key '{frame_key}' is not a frame number; skipped"
                ));
                continue;
            };
            match read_keyframe(frame, raw_kf) {
                Ok(kf) => {
                    track.insert(kf);
                }
                Err(reason) => warnings.push(format!(
                    "track '{anim_id}', frame {frame}: {reason}; skipped"
                )),
            }
        }
        library.insert(anim_id, track);
    }
    library
}

fn read_keyframe(frame: u32, raw: JsonValue) -> Result<Keyframe, String> {
    let raw: RawKeyframe = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    let props = match raw.props {
        None | Some(JsonValue::Null) => Default::default(),
        Some(p) => props_from_json(p).map_err(|e| e.to_string())?,
    };
    let smooth = !matches!(raw.smooth, Some(JsonValue::Bool(false)));
    Ok(Keyframe {
        frame,
        props,
        smooth,
    })
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    canvas_width: Option<JsonValue>,
    #[serde(default)]
    canvas_height: Option<JsonValue>,
    #[serde(default)]
    canvas_background: Option<String>,
    #[serde(default)]
    canvas: JsonValue,
    #[serde(default)]
    animation: Option<RawAnimation>,
    #[serde(default)]
    project_script: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnimation {
    #[serde(default)]
    total_frames: Option<JsonValue>,
    #[serde(default)]
    fps: Option<JsonValue>,
    #[serde(default)]
    data: Option<IndexMap<String, RawTrack>>,
}

/// Tracks are read as ordered maps so duplicate frame keys resolve in document order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTrack {
    Keyed(IndexMap<String, JsonValue>),
    Other(JsonValue),
}

#[derive(Debug, Deserialize)]
struct RawKeyframe {
    #[serde(default)]
    props: Option<JsonValue>,
    #[serde(default)]
    smooth: Option<JsonValue>,
}
