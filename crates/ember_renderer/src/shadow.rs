//! Light visibility for shadowing.

use ember_core::{Light, ShadowMode, ShadowSettings};
use ember_math::directions::sample_disc;
use ember_math::Vec3;
use rand::RngCore;

use crate::RenderScene;

/// Fraction of `light` visible from `point`, in [0, 1].
///
/// Hard shadows trace a single ray to the light center. Soft shadows trace
/// `rays_per_light` rays to random points on the light's disc and return the
/// unblocked fraction; a light without a disc falls back to the hard test.
pub fn light_visibility(
    scene: &RenderScene,
    point: Vec3,
    light: &Light,
    settings: &ShadowSettings,
    rng: &mut dyn RngCore,
) -> f32 {
    match settings.mode {
        ShadowMode::None => 1.0,
        ShadowMode::Soft if light.is_area() && settings.rays_per_light > 0 => {
            let visible = (0..settings.rays_per_light)
                .filter(|_| {
                    let target = sample_disc(light.position, light.normal, light.radius, rng);
                    !scene.occluded(point, target)
                })
                .count();
            visible as f32 / settings.rays_per_light as f32
        }
        ShadowMode::Hard | ShadowMode::Soft => {
            if scene.occluded(point, light.position) {
                0.0
            } else {
                1.0
            }
        }
    }
}
