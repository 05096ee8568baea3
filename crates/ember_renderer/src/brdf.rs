//! Ambient + Lambertian + Phong reflectance.

use ember_core::Surface;
use ember_math::{Color, Vec3};

/// Which BRDF terms to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrdfTerms {
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
}

impl BrdfTerms {
    pub const ALL: Self = Self {
        ambient: true,
        diffuse: true,
        specular: true,
    };

    /// Used at path-tracing bounces and for surfel colors.
    pub const DIFFUSE: Self = Self {
        ambient: false,
        diffuse: true,
        specular: false,
    };
}

/// A light as seen from one shading point.
///
/// `intensity` already includes the light's visibility from that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

#[inline]
fn ambient(surface: &Surface) -> Color {
    surface.ambient_color * surface.ambient
}

/// Sum of diffuse and specular reflection over `lights`.
///
/// `view` points from the surface towards the viewer.
pub fn reflected(
    surface: &Surface,
    terms: BrdfTerms,
    point: Vec3,
    normal: Vec3,
    view: Vec3,
    lights: &[LightSample],
) -> Color {
    if !terms.diffuse && !terms.specular {
        return Color::ZERO;
    }

    let mut total = Color::ZERO;
    for light in lights {
        if light.intensity <= 0.0 {
            continue;
        }
        let Some(to_light) = (light.position - point).try_normalize() else {
            continue;
        };
        let n_dot_l = normal.dot(to_light);
        if n_dot_l <= 0.0 {
            continue;
        }

        let mut response = Color::ZERO;
        if terms.diffuse {
            response += surface.diffuse_color * surface.diffuse * n_dot_l;
        }
        if terms.specular && surface.specular > 0.0 {
            let r = 2.0 * n_dot_l * normal - to_light;
            let r_dot_v = r.dot(view).max(0.0);
            response += surface.specular_color * surface.specular * r_dot_v.powf(surface.shininess);
        }
        total += light.intensity * light.color * response;
    }
    total
}

/// Ambient once, scaled by `occlusion`, plus the per-light terms.
pub fn evaluate(
    surface: &Surface,
    terms: BrdfTerms,
    occlusion: f32,
    point: Vec3,
    normal: Vec3,
    view: Vec3,
    lights: &[LightSample],
) -> Color {
    let base = if terms.ambient {
        ambient(surface) * occlusion
    } else {
        Color::ZERO
    };
    base + reflected(surface, terms, point, normal, view, lights)
}
