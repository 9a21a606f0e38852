//! Core configuration for keyreel-player-core.

use serde::{Deserialize, Serialize};

/// Player configuration: document fallbacks, startup sequencing, sandbox limits.
/// Every field has a default so hosts can pass a partial JSON object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Used when the document omits `animation.totalFrames` (or gives a value below 1).
    pub default_total_frames: u32,
    /// Used when the document omits `animation.fps` (or gives a non-positive value).
    pub default_fps: f64,
    pub default_canvas_width: u32,
    pub default_canvas_height: u32,
    pub default_canvas_background: String,

    pub startup: StartupCfg,
    pub sandbox: SandboxCfg,
    pub diagnostics: DiagnosticsCfg,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_total_frames: 30,
            default_fps: 12.0,
            default_canvas_width: 800,
            default_canvas_height: 600,
            default_canvas_background: "#ffffff".to_string(),
            startup: StartupCfg::default(),
            sandbox: SandboxCfg::default(),
            diagnostics: DiagnosticsCfg::default(),
        }
    }
}

/// What `Session::start` does once the scene is loaded.
///
/// A delay of `None` runs the step synchronously inside `start`; `Some(ms)` schedules
/// it as an untracked timer. The script always gets the chance to run before autoplay
/// when both are immediate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupCfg {
    pub run_script: bool,
    pub script_delay_ms: Option<f64>,
    pub autoplay: bool,
    pub autoplay_delay_ms: Option<f64>,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            run_script: true,
            script_delay_ms: None,
            autoplay: true,
            autoplay_delay_ms: None,
        }
    }
}

impl StartupCfg {
    /// Staggered startup used by the standalone player page: script at 500 ms,
    /// playback at 800 ms, leaving room for the loading screen to fade.
    pub fn staggered() -> Self {
        Self {
            run_script: true,
            script_delay_ms: Some(500.0),
            autoplay: true,
            autoplay_delay_ms: Some(800.0),
        }
    }
}

/// Resource limits applied to the embedded script engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxCfg {
    /// Upper bound on operations per evaluation or callback (stops runaway loops).
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for SandboxCfg {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_string_size: 10_000,
            max_array_size: 10_000,
            max_map_size: 1_000,
        }
    }
}

/// Diagnostics retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
    /// Maximum records kept by an in-memory sink; older records are dropped first.
    pub max_retained: usize,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg {
            enabled: true,
            max_retained: 256,
        }
    }
}
