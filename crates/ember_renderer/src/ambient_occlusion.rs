use ember_core::AmbientOcclusionSettings;
use ember_math::directions::sample_cone;
use ember_math::Vec3;
use rand::RngCore;

use crate::RenderScene;

/// Local occlusion estimate at a surface point.
///
/// Casts `rays_per_point` rays in a cone around `normal` and counts the ones
/// that hit something within `radius`. Returns
/// `intensity * (1 - occluded / rays)`, or plain `intensity` when no rays
/// are configured.
pub fn ambient_occlusion(
    scene: &RenderScene,
    point: Vec3,
    normal: Vec3,
    settings: &AmbientOcclusionSettings,
    rng: &mut dyn RngCore,
) -> f32 {
    let rays = settings.rays_per_point;
    if rays == 0 || settings.radius <= 0.0 {
        return settings.intensity;
    }
    let Some(normal) = normal.try_normalize() else {
        return settings.intensity;
    };

    let max_angle = settings.max_angle_degrees.to_radians();
    let occluded = (0..rays)
        .filter(|_| {
            let direction = sample_cone(normal, max_angle, rng);
            scene
                .intersect_within(point, direction, settings.radius, true)
                .is_some()
        })
        .count();

    settings.intensity * (1.0 - occluded as f32 / rays as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Material, Mesh, ObjectDesc, SceneDesc};
    use ember_math::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// A large ceiling at z = `height`, facing down.
    fn ceiling(height: f32) -> RenderScene {
        let mut desc = SceneDesc::new();
        let grey = desc.add_material(Material::matte(Color::splat(0.5)));
        let quad = Mesh::quad("ceiling", Vec3::new(0.0, 0.0, height), Vec3::Y * 50.0, Vec3::X * 50.0).unwrap();
        desc.add_object(ObjectDesc::new("ceiling", Arc::new(quad), grey));
        RenderScene::build(&desc).unwrap()
    }

    fn settings(rays: u32) -> AmbientOcclusionSettings {
        AmbientOcclusionSettings {
            rays_per_point: rays,
            max_angle_degrees: 60.0,
            radius: 1.0,
            intensity: 0.8,
            only_ao: false,
        }
    }

    #[test]
    fn test_zero_rays_returns_intensity() {
        let scene = ceiling(0.1);
        let mut rng = StdRng::seed_from_u64(0);

        let ao = ambient_occlusion(&scene, Vec3::ZERO, Vec3::Z, &settings(0), &mut rng);
        assert_eq!(ao, 0.8);
    }

    #[test]
    fn test_close_ceiling_fully_occludes() {
        let scene = ceiling(0.1);
        let mut rng = StdRng::seed_from_u64(0);

        let ao = ambient_occlusion(&scene, Vec3::ZERO, Vec3::Z, &settings(32), &mut rng);
        assert_eq!(ao, 0.0);
    }

    #[test]
    fn test_distant_ceiling_is_ignored() {
        let scene = ceiling(10.0);
        let mut rng = StdRng::seed_from_u64(0);

        let ao = ambient_occlusion(&scene, Vec3::ZERO, Vec3::Z, &settings(32), &mut rng);
        assert_eq!(ao, 0.8);
    }
}
