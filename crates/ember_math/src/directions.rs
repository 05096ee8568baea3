//! Direction helpers shared by the shading and sampling code.

use std::f32::consts::TAU;

use rand::{Rng, RngCore};

use crate::Vec3;

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Reflect `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the unit vector `uv` through a surface with normal `n`.
///
/// Returns `None` on total internal reflection.
pub fn refract(uv: Vec3, n: Vec3, eta_ratio: f32) -> Option<Vec3> {
    let cos_theta = (-uv).dot(n).min(1.0);
    let sin_theta_sq = 1.0 - cos_theta * cos_theta;
    if eta_ratio * eta_ratio * sin_theta_sq > 1.0 {
        return None;
    }
    let r_out_perp = eta_ratio * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    Some(r_out_perp + r_out_parallel)
}

/// Schlick's approximation of Fresnel reflectance.
pub fn schlick(cosine: f32, eta_ratio: f32) -> f32 {
    let r0 = ((1.0 - eta_ratio) / (1.0 + eta_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Two unit vectors completing `normal` to an orthonormal basis.
///
/// `normal` must be normalized.
#[inline]
pub fn tangent_frame(normal: Vec3) -> (Vec3, Vec3) {
    normal.any_orthonormal_pair()
}

/// Random direction inside a cone of half-angle `max_angle` (radians) around `axis`.
///
/// The rotation about the axis is uniform, and so is the cosine of the polar
/// angle, which makes the samples uniform over the spherical cap.
pub fn sample_cone(axis: Vec3, max_angle: f32, rng: &mut dyn RngCore) -> Vec3 {
    let max_angle = max_angle.clamp(0.0, std::f32::consts::PI);
    let cos_max = max_angle.cos();
    let cos_theta = 1.0 - gen_f32(rng) * (1.0 - cos_max);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = gen_f32(rng) * TAU;

    let (t, b) = tangent_frame(axis);
    (axis * cos_theta + t * (sin_theta * phi.cos()) + b * (sin_theta * phi.sin())).normalize()
}

/// Random point in the unit disk (z = 0), by rejection.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Random point on a disc of `radius` centered at `center`, lying in the plane
/// perpendicular to `normal`.
pub fn sample_disc(center: Vec3, normal: Vec3, radius: f32, rng: &mut dyn RngCore) -> Vec3 {
    let Some(normal) = normal.try_normalize() else {
        return center;
    };
    let (t, b) = tangent_frame(normal);
    let p = random_in_unit_disk(rng);
    center + (t * p.x + b * p.y) * radius
}

/// Largest per-face grid resolution [`cube_directions`] will use.
pub const MAX_CUBE_RESOLUTION: u32 = 256;

/// The grid resolution actually used for a requested one.
#[inline]
pub fn cube_resolution(requested: u32) -> u32 {
    requested.clamp(1, MAX_CUBE_RESOLUTION)
}

/// Number of directions [`cube_directions`] returns for `resolution`.
pub fn cube_direction_count(resolution: u32) -> usize {
    let n = cube_resolution(resolution) as usize;
    6 * n * n
}

/// Unit directions through the cell centers of a `resolution` x `resolution`
/// grid on each of the six faces of the cube [-1, 1]^3.
///
/// The resolution is clamped to `1..=MAX_CUBE_RESOLUTION`.
pub fn cube_directions(resolution: u32) -> Vec<Vec3> {
    let n = cube_resolution(resolution);
    let mut directions = Vec::with_capacity(cube_direction_count(n));
    let step = 2.0 / n as f32;

    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            for i in 0..n {
                for j in 0..n {
                    let a = -1.0 + (i as f32 + 0.5) * step;
                    let b = -1.0 + (j as f32 + 0.5) * step;
                    let mut d = Vec3::ZERO;
                    d[axis] = sign;
                    d[(axis + 1) % 3] = a;
                    d[(axis + 2) % 3] = b;
                    directions.push(d.normalize());
                }
            }
        }
    }

    directions
}

/// Cube directions restricted to the open hemisphere around `normal`.
pub fn cube_hemisphere(normal: Vec3, resolution: u32) -> Vec<Vec3> {
    cube_directions(resolution)
        .into_iter()
        .filter(|d| d.dot(normal) > 0.0)
        .collect()
}
