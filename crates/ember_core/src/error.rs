use thiserror::Error;

/// Errors raised while assembling a scene or reading render settings.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Mesh '{0}' has no triangles")]
    EmptyMesh(String),

    #[error(
        "Mesh '{mesh}' triangle {triangle} references vertex {index}, but only {vertex_count} vertices exist"
    )]
    InvalidTriangle {
        mesh: String,
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Object '{object}' references unknown material {material}")]
    MissingMaterial { object: String, material: usize },
}

/// Result type for scene assembly.
pub type SceneResult<T> = Result<T, SceneError>;
