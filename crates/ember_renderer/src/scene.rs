//! Scene-level intersection across every enabled object.

use ember_core::{Light, Material, SceneDesc, SceneError, SceneResult};
use ember_math::{BoundingBox, Vec3};

use crate::ray::SELF_HIT_EPSILON;
use crate::{Ray, RayHit, SceneObject};

/// The renderer's view of a scene: objects with built k-d trees plus lights.
#[derive(Debug, Clone, Default)]
pub struct RenderScene {
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
}

impl RenderScene {
    /// Build k-d trees for every object of `desc`.
    pub fn build(desc: &SceneDesc) -> SceneResult<Self> {
        desc.validate()?;

        let mut objects = Vec::with_capacity(desc.objects.len());
        for object in &desc.objects {
            let material = desc
                .material(object.material)
                .cloned()
                .ok_or_else(|| SceneError::MissingMaterial {
                    object: object.name.clone(),
                    material: object.material,
                })?;
            objects.push(SceneObject::new(object, material));
        }

        log::info!(
            "Built render scene: {} objects, {} triangles, {} lights",
            objects.len(),
            desc.total_triangle_count(),
            desc.lights.len()
        );

        Ok(Self {
            objects,
            lights: desc.lights.clone(),
        })
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    /// Material of the object a hit belongs to.
    pub fn material_of(&self, hit: &RayHit) -> Option<&Material> {
        hit.object
            .and_then(|index| self.objects.get(index))
            .map(SceneObject::material)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn enabled_lights(&self) -> impl Iterator<Item = &Light> + '_ {
        self.lights.iter().filter(|light| light.enabled)
    }

    pub fn has_enabled_lights(&self) -> bool {
        self.lights.iter().any(|light| light.enabled)
    }

    pub fn has_mobile_objects(&self) -> bool {
        self.objects.iter().any(|o| o.enabled && o.is_mobile())
    }

    /// World bounds of all enabled objects.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.objects
            .iter()
            .filter(|o| o.enabled)
            .map(SceneObject::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Closest hit along a ray, in world space.
    ///
    /// With `stop_at_first` the first hit found is returned, which is only
    /// useful for visibility questions.
    pub fn intersect(&self, origin: Vec3, direction: Vec3, stop_at_first: bool) -> Option<RayHit> {
        self.intersect_within(origin, direction, f32::INFINITY, stop_at_first)
    }

    /// Like [`intersect`](Self::intersect), ignoring anything `max_distance`
    /// or more away from `origin`.
    pub fn intersect_within(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        stop_at_first: bool,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let start = origin + direction * SELF_HIT_EPSILON;
        let mut limit = max_distance - SELF_HIT_EPSILON;
        if limit <= 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (index, object) in self.objects.iter().enumerate() {
            if !object.enabled {
                continue;
            }

            let translation = object.translation();
            let mut ray = Ray::with_limit(start - translation, direction, limit);
            if !object.intersect_local(&mut ray, stop_at_first) {
                continue;
            }
            ray.set_object(index);

            if let Some(mut hit) = ray.into_hit() {
                let local_distance = hit.distance();
                limit = local_distance;
                hit.position += translation;
                let distance = local_distance + SELF_HIT_EPSILON;
                hit.distance_squared = distance * distance;
                best = Some(hit);

                if stop_at_first {
                    break;
                }
            }
        }
        best
    }

    /// Whether anything blocks the segment from `from` to `to`.
    pub fn occluded(&self, from: Vec3, to: Vec3) -> bool {
        let offset = to - from;
        let distance = offset.length();
        if distance <= 2.0 * SELF_HIT_EPSILON {
            return false;
        }
        self.intersect_within(from, offset, distance - SELF_HIT_EPSILON, true)
            .is_some()
    }

    /// Move every mobile object one motion-blur step.
    pub fn advance_motion(&mut self, frame_count: u32) {
        for object in &mut self.objects {
            object.advance(frame_count);
        }
    }

    /// Put every object back at its original translation.
    pub fn reset_motion(&mut self) {
        for object in &mut self.objects {
            object.reset_translation();
        }
    }

    pub fn total_triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh().triangle_count()).sum()
    }
}
