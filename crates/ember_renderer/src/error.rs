use ember_core::SceneError;
use thiserror::Error;

/// Errors reported by the renderer and its background worker.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render a {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error("A render is already in progress")]
    Busy,

    #[error("Render thread panicked")]
    WorkerPanicked,

    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}
