//! Recursive indirect diffuse lighting through virtual point lights.
//!
//! Each bounce shoots `rays_per_bounce` rays in a cone around the normal. A
//! ray that hits a surface turns the hit into a point light carrying that
//! surface's diffuse shading, attenuated by `(1 + distance)^3` and shared
//! between the rays of the bounce. The shading at the hit is itself lit by the
//! next bounce until `max_depth` is reached.

use ember_math::directions::sample_cone;
use ember_math::Vec3;
use rand::RngCore;

use crate::brdf::{self, BrdfTerms, LightSample};
use crate::shading::ShadingContext;

/// Virtual lights seen from `point` at bounce `depth`.
pub fn gather(
    ctx: &ShadingContext<'_>,
    point: Vec3,
    normal: Vec3,
    depth: u32,
    rng: &mut dyn RngCore,
) -> Vec<LightSample> {
    let settings = &ctx.settings.path_tracing;
    let rays = settings.rays_per_bounce;
    if depth >= settings.max_depth || rays == 0 {
        return Vec::new();
    }
    let Some(normal) = normal.try_normalize() else {
        return Vec::new();
    };

    let max_angle = settings.max_angle_degrees.to_radians();
    let mut lights = Vec::with_capacity(rays as usize);

    for _ in 0..rays {
        let direction = sample_cone(normal, max_angle, rng);
        let Some(hit) = ctx.scene.intersect(point, direction, false) else {
            continue;
        };
        let Some(surface) = ctx.scene.material_of(&hit).and_then(|m| m.surface()) else {
            continue;
        };

        let mut bounce_lights = ctx.direct_lights(hit.position, rng);
        bounce_lights.extend(gather(ctx, hit.position, hit.normal, depth + 1, rng));
        let color = brdf::reflected(
            surface,
            BrdfTerms::DIFFUSE,
            hit.position,
            hit.normal,
            -direction,
            &bounce_lights,
        );
        if color == Vec3::ZERO {
            continue;
        }

        let attenuation = (1.0 + hit.distance()).powi(3) * rays as f32;
        lights.push(LightSample {
            position: hit.position,
            color,
            intensity: settings.intensity / attenuation,
        });
    }
    lights
}
