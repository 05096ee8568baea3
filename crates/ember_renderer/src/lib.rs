//! Ember Renderer - offline CPU ray tracing.
//!
//! Builds a k-d tree per object and renders images with:
//! - Antialiasing, depth of field and motion blur
//! - Ambient, Lambertian and Phong shading with hard or soft shadows
//! - Ambient occlusion
//! - Indirect diffuse light, by recursive path tracing or from a surfel cloud
//! - Mirror and thin glass materials
//!
//! A [`Renderer`] renders synchronously; a [`RenderWorker`] runs it on a
//! background thread and reports progress over a channel.

mod accumulator;
pub mod ambient_occlusion;
pub mod brdf;
mod error;
mod kd_tree;
mod object;
pub mod path_tracer;
pub mod pbgi;
mod progress;
mod ray;
mod renderer;
pub mod sampling;
mod scene;
pub mod shading;
pub mod shadow;
mod worker;

pub use accumulator::{to_rgb8, ColorAccumulator};
pub use error::RenderError;
pub use kd_tree::{KdNode, KdNodeKind, KdTree, NodeId, LEAF_TRIANGLE_THRESHOLD};
pub use object::SceneObject;
pub use progress::Progress;
pub use ray::{Ray, RayHit, SELF_HIT_EPSILON};
pub use renderer::{PixelBuffer, RenderOutcome, Renderer};
pub use scene::RenderScene;
pub use shading::ShadingContext;
pub use worker::{RenderEvent, RenderWorker};

/// Re-export math types from ember_math
pub use ember_math::{BoundingBox, Color, Vec2, Vec3};
