//! Renderable objects: a mesh with its k-d tree, a material and a placement.

use std::sync::Arc;

use ember_core::{Material, Mesh, ObjectDesc};
use ember_math::{BoundingBox, Vec3};

use crate::{KdTree, Ray};

/// A mesh placed in the scene.
///
/// The k-d tree is built once, in mesh-local space. Moving the object only
/// changes `translation`; rays are moved into local space instead of the
/// geometry being touched.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    mesh: Arc<Mesh>,
    material: Arc<Material>,
    translation: Vec3,
    original_translation: Vec3,
    motion: Option<Vec3>,
    pub enabled: bool,
    kd_tree: KdTree,
}

impl SceneObject {
    pub fn new(desc: &ObjectDesc, material: Arc<Material>) -> Self {
        Self {
            name: desc.name.clone(),
            mesh: Arc::clone(&desc.mesh),
            material,
            translation: desc.translation,
            original_translation: desc.translation,
            motion: desc.motion.filter(|m| *m != Vec3::ZERO),
            enabled: desc.enabled,
            kd_tree: KdTree::build(&desc.mesh),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn kd_tree(&self) -> &KdTree {
        &self.kd_tree
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn is_mobile(&self) -> bool {
        self.motion.is_some()
    }

    /// World-space bounds at the current translation.
    pub fn bounds(&self) -> BoundingBox {
        self.kd_tree.bounds().translate(self.translation)
    }

    /// Move one motion-blur step: `motion / frame_count`.
    pub fn advance(&mut self, frame_count: u32) {
        if let Some(motion) = self.motion {
            self.translation += motion / frame_count.max(1) as f32;
        }
    }

    pub fn reset_translation(&mut self) {
        self.translation = self.original_translation;
    }

    /// Intersect a ray given in object-local space.
    pub fn intersect_local(&self, ray: &mut Ray, stop_at_first: bool) -> bool {
        self.kd_tree.intersect(&self.mesh, ray, stop_at_first)
    }
}
