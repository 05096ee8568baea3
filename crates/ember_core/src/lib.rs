//! Ember Core - scene description and render configuration.
//!
//! This crate provides the types a host hands to the renderer:
//!
//! - **Geometry**: `Vertex`, `Triangle`, `Mesh`
//! - **Scene**: `Material`, `Light`, `ObjectDesc`, `SceneDesc`
//! - **Camera**: the `Camera` descriptor
//! - **Settings**: `RenderSettings`, loadable from JSON
//!
//! # Example
//!
//! ```ignore
//! use ember_core::{Mesh, Material, ObjectDesc, SceneDesc};
//!
//! let mut scene = SceneDesc::new();
//! let grey = scene.add_material(Material::matte(Color::splat(0.7)));
//! let floor = Mesh::quad("floor", Vec3::ZERO, Vec3::Z * 5.0, Vec3::X * 5.0)?;
//! scene.add_object(ObjectDesc::new("floor", Arc::new(floor), grey));
//! ```

pub mod camera;
pub mod error;
pub mod mesh;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use camera::Camera;
pub use error::{SceneError, SceneResult};
pub use mesh::{Mesh, Triangle, Vertex};
pub use scene::{Light, Material, ObjectDesc, SceneDesc, Surface};
pub use settings::{
    AmbientOcclusionSettings, AntialiasingKind, AntialiasingSettings, FocusKind, FocusSettings,
    MirrorSettings, MotionBlurSettings, PathTracingSettings, PointGiSettings, ProgressSettings,
    RenderSettings, ShadowMode, ShadowSettings,
};
