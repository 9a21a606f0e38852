use thiserror::Error;

use crate::document::DocumentError;
use crate::scene::SurfaceError;

/// Faults that stop a session from loading or starting. Script and property faults
/// never surface here; they go to the diagnostics sink.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("scene must be loaded before the session starts")]
    NotLoaded,
    #[error("session has been torn down")]
    TornDown,
}
