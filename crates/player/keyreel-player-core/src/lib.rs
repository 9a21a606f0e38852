//! keyreel player core (engine-agnostic)
//!
//! Plays keyframe-animated scenes: sparse per-object tracks are resolved frame by
//! frame and applied to whatever rendering surface the host provides, while an
//! optional project script runs in a sandbox with a narrow capability set.
//!
//! The host supplies three things: a [`RenderSurface`], a [`Scheduler`] and a
//! [`Diagnostics`] sink. A [`Session`] owns everything else. The [`headless`] module
//! has in-memory versions of the first two for tests and tooling.

pub mod clock;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod headless;
pub mod ids;
pub mod interp;
pub mod query;
pub mod sampling;
pub mod scene;
pub mod script;
pub mod session;
pub mod timers;

// Re-exports for hosts
pub use clock::{Clock, ClockState, FrameInput, FrameTarget, PlaybackState};
pub use config::{DiagnosticsCfg, PlayerConfig, SandboxCfg, StartupCfg};
pub use data::{AnimationLibrary, Keyframe, Track};
pub use diagnostics::{
    Diagnostic, DiagnosticLog, DiagnosticSource, Diagnostics, LogDiagnostics, Severity,
};
pub use document::{CanvasSettings, DocumentError, SceneDocument};
pub use error::PlayerError;
pub use ids::{CallbackId, ObjectKey, TimerHandle};
pub use interp::{interpolate, interpolate_props};
pub use query::ObjectQuery;
pub use sampling::resolve;
pub use scene::{RenderSurface, SceneObject, SurfaceError};
pub use script::{Capabilities, ScriptError, ScriptObject, ScriptSandbox};
pub use session::{Phase, Session};
pub use timers::{Scheduler, TimerKind, TimerRegistry, TimerTask};
pub use keyreel_api_core::{PropValue, PropertySet, Shadow};
