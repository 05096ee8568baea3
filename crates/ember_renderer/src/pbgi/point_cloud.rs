use std::f32::consts::PI;
use std::time::Instant;

use ember_core::RenderSettings;
use ember_math::directions::{
    cube_direction_count, cube_directions, cube_hemisphere, cube_resolution, MAX_CUBE_RESOLUTION,
};
use ember_math::Vec3;
use rand::RngCore;

use super::{Octree, Surfel};
use crate::brdf::LightSample;
use crate::shading::ShadingContext;
use crate::{Ray, RenderScene};

/// Grazing hits stretch a footprint at most this much.
const MIN_FOOTPRINT_COSINE: f32 = 0.2;

/// Surfels shot from every light, with an octree over them.
#[derive(Debug, Clone)]
pub struct PointCloud {
    surfels: Vec<Surfel>,
    octree: Octree,
}

impl PointCloud {
    pub fn from_surfels(surfels: Vec<Surfel>) -> Self {
        let octree = Octree::build(&surfels);
        Self { surfels, octree }
    }

    /// Shoot `light_resolution` cube-mapped rays from every enabled light and
    /// record a surfel where each one lands on a diffuse surface.
    ///
    /// Area lights only shoot into the hemisphere their normal faces. Mirror,
    /// glass and sky-box hits are skipped.
    pub fn build(scene: &RenderScene, settings: &RenderSettings, rng: &mut dyn RngCore) -> Self {
        let start = Instant::now();
        let ctx = ShadingContext::new(scene, settings);
        let requested = settings.point_gi.light_resolution;
        let resolution = cube_resolution(requested);
        for (name, value) in [("light", requested), ("gather", settings.point_gi.gather_resolution)] {
            if value > MAX_CUBE_RESOLUTION {
                log::warn!("Point GI {name} resolution {value} clamped to {MAX_CUBE_RESOLUTION}");
            }
        }
        let sample_solid_angle = 4.0 * PI / cube_direction_count(resolution) as f32;

        let mut surfels = Vec::new();
        for light in scene.enabled_lights() {
            let directions = if light.is_area() {
                cube_hemisphere(light.normal, resolution)
            } else {
                cube_directions(resolution)
            };

            for direction in directions {
                let Some(hit) = scene.intersect(light.position, direction, false) else {
                    continue;
                };
                let Some(material) = scene.material_of(&hit) else {
                    continue;
                };
                if material.is_glossy() || material.is_environment() {
                    continue;
                }
                let Some(surface) = material.surface() else {
                    continue;
                };

                let cosine = direction.dot(hit.normal).abs().max(MIN_FOOTPRINT_COSINE);
                let radius = hit.distance() * (sample_solid_angle / PI).sqrt() / cosine;
                let color = ctx.direct_diffuse(surface, &hit, -direction, rng);

                surfels.push(Surfel::new(hit.position, hit.normal, radius, color).with_object(hit.object));
            }
        }

        let cloud = Self::from_surfels(surfels);
        log::info!(
            "Built point cloud: {} surfels, {} octree nodes in {:.2?}",
            cloud.surfels.len(),
            cloud.octree.node_count(),
            start.elapsed()
        );
        cloud
    }

    pub fn surfels(&self) -> &[Surfel] {
        &self.surfels
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn len(&self) -> usize {
        self.surfels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfels.is_empty()
    }

    /// Nearest-first surfel hit along a ray, with its distance.
    pub fn intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(&Surfel, f32)> {
        let ray = Ray::new(origin, direction);
        self.octree
            .intersect(&self.surfels, &ray, max_distance)
            .map(|(index, t)| (&self.surfels[index], t))
    }

    /// Surfels visible from `point` over the hemisphere around `normal`, as
    /// virtual lights weighted by `intensity / (1 + distance)^3`.
    pub fn gather(&self, point: Vec3, normal: Vec3, settings: &RenderSettings) -> Vec<LightSample> {
        let Some(normal) = normal.try_normalize() else {
            return Vec::new();
        };
        let intensity = settings.path_tracing.intensity;
        let max_distance = settings.point_gi.max_distance;

        cube_hemisphere(normal, settings.point_gi.gather_resolution)
            .into_iter()
            .filter_map(|direction| {
                let (surfel, t) = self.intersect(point, direction, max_distance)?;
                Some(LightSample {
                    position: surfel.position,
                    color: surfel.color,
                    intensity: intensity / (1.0 + t).powi(3),
                })
            })
            .collect()
    }
}
