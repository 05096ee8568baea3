//! Ray state and the primitive intersection routines.
//!
//! A [`Ray`] carries its own "closest hit so far" record. Every successful
//! test against a triangle tightens that record, so a ray can be pushed through
//! any number of primitives and ends up holding the nearest one.

use ember_core::Vertex;
use ember_math::{BoundingBox, Vec2, Vec3};

/// Offset applied along rays that leave a surface, to avoid hitting it again.
pub const SELF_HIT_EPSILON: f32 = 1e-3;

/// Below this a determinant or dot product is treated as zero.
const PARALLEL_EPSILON: f32 = 1e-9;

/// True for a triangle too small to ever be hit.
pub(crate) fn is_degenerate(vertices: [&Vertex; 3]) -> bool {
    let [v0, v1, v2] = vertices;
    let area = (v1.position - v0.position).cross(v2.position - v0.position);
    area.length_squared() < PARALLEL_EPSILON * PARALLEL_EPSILON
}

/// Closest intersection recorded on a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Squared distance from the ray origin.
    pub distance_squared: f32,
    pub position: Vec3,
    /// Interpolated unit shading normal.
    pub normal: Vec3,
    /// Scene object index, filled in by the scene intersector.
    pub object: Option<usize>,
    pub triangle: usize,
    /// Barycentric weights of vertices 1 and 2.
    pub uv: Vec2,
}

impl RayHit {
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance_squared.sqrt()
    }
}

/// A ray with mutable nearest-hit bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    origin: Vec3,
    /// Unit direction, or zero for a degenerate ray that never hits.
    direction: Vec3,
    /// Hits at or beyond this squared distance are ignored.
    limit_squared: f32,
    hit: Option<RayHit>,
}

impl Ray {
    /// Create an unbounded ray. The direction is normalized.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            limit_squared: f32::INFINITY,
            hit: None,
        }
    }

    /// Create a ray that only reports hits closer than `max_distance`.
    #[inline]
    pub fn with_limit(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            limit_squared: max_distance * max_distance,
            ..Self::new(origin, direction)
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point at distance `t` along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    #[inline]
    pub fn has_intersection(&self) -> bool {
        self.hit.is_some()
    }

    #[inline]
    pub fn hit(&self) -> Option<&RayHit> {
        self.hit.as_ref()
    }

    #[inline]
    pub fn into_hit(self) -> Option<RayHit> {
        self.hit
    }

    /// Squared distance a new hit has to beat.
    #[inline]
    pub fn best_distance_squared(&self) -> f32 {
        self.hit
            .map(|hit| hit.distance_squared)
            .unwrap_or(self.limit_squared)
    }

    /// Tag the current hit with the scene object it belongs to.
    pub fn set_object(&mut self, object: usize) {
        if let Some(hit) = self.hit.as_mut() {
            hit.object = Some(object);
        }
    }

    /// Forget the recorded hit, keeping origin, direction and limit.
    pub fn clear_hit(&mut self) {
        self.hit = None;
    }

    /// Plane/barycentric test against one triangle.
    ///
    /// The triangle plane normal is oriented to agree with vertex 0's normal,
    /// and triangles seen from behind are rejected. On success the hit replaces
    /// the current record only if it is closer.
    pub fn intersect_triangle(&mut self, vertices: [&Vertex; 3], triangle: usize) -> bool {
        let [v0, v1, v2] = vertices;
        let (p0, p1, p2) = (v0.position, v1.position, v2.position);

        if is_degenerate(vertices) {
            return false;
        }
        let mut plane_normal = (p1 - p0).cross(p2 - p0);
        let area_sq = plane_normal.length_squared();
        if plane_normal.dot(v0.normal) < 0.0 {
            plane_normal = -plane_normal;
        }

        // Back-facing or parallel.
        let denom = plane_normal.dot(self.direction);
        if denom > -PARALLEL_EPSILON {
            return false;
        }

        let t = plane_normal.dot(p0 - self.origin) / denom;
        if t <= 0.0 {
            return false;
        }
        let point = self.at(t);

        // Each weight is the signed area opposite its vertex.
        let w0 = (p1 - point).cross(p2 - point).dot(plane_normal) / area_sq;
        let w1 = (p2 - point).cross(p0 - point).dot(plane_normal) / area_sq;
        let w2 = 1.0 - w0 - w1;
        if !(0.0..=1.0).contains(&w0) || !(0.0..=1.0).contains(&w1) || w0 + w1 > 1.0 {
            return false;
        }

        let distance_squared = (point - self.origin).length_squared();
        if distance_squared >= self.best_distance_squared() {
            return false;
        }

        let normal = (v0.normal * w0 + v1.normal * w1 + v2.normal * w2)
            .try_normalize()
            .unwrap_or_else(|| plane_normal.normalize());

        self.hit = Some(RayHit {
            distance_squared,
            position: point,
            normal,
            object: None,
            triangle,
            uv: Vec2::new(w1, w2),
        });
        true
    }

    /// Squared distance to the point where the ray enters `bounds`, zero when
    /// the origin is inside.
    #[inline]
    pub fn intersect_box(&self, bounds: &BoundingBox) -> Option<f32> {
        bounds
            .intersect(self.origin, self.direction)
            .map(|entry| (entry - self.origin).length_squared())
    }

    /// Distance along the ray to a two-sided disc, if it is hit.
    pub fn intersect_disc(&self, center: Vec3, normal: Vec3, radius: f32) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = normal.dot(center - self.origin) / denom;
        if !t.is_finite() || t <= SELF_HIT_EPSILON {
            return None;
        }
        if (self.at(t) - center).length_squared() > radius * radius {
            return None;
        }
        Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_z() -> [Vertex; 3] {
        [
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::Z),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0), Vec3::Z),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z),
        ]
    }

    fn refs(v: &[Vertex; 3]) -> [&Vertex; 3] {
        [&v[0], &v[1], &v[2]]
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.direction(), Vec3::X);
        assert_eq!(ray.at(2.5), Vec3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn test_triangle_hit_facing_z() {
        let tri = facing_z();
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

        assert!(ray.intersect_triangle(refs(&tri), 0));
        let hit = ray.hit().unwrap();
        assert!((hit.position - Vec3::ZERO).length() < 1e-6);
        assert!((hit.normal - Vec3::Z).length() < 1e-6);
        assert!((hit.distance_squared - 25.0).abs() < 1e-4);
        assert!((hit.distance() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_back_face_rejected() {
        let tri = facing_z();
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(!ray.intersect_triangle(refs(&tri), 0));
        assert!(!ray.has_intersection());
    }

    #[test]
    fn test_triangle_behind_origin_rejected() {
        let tri = facing_z();
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(!ray.intersect_triangle(refs(&tri), 0));
    }

    #[test]
    fn test_triangle_outside_rejected() {
        let tri = facing_z();
        let mut ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), -Vec3::Z);
        assert!(!ray.intersect_triangle(refs(&tri), 0));
    }

    #[test]
    fn test_only_closer_hits_replace() {
        let near = facing_z();
        let far: [Vertex; 3] = near.map(|v| Vertex::new(v.position - Vec3::Z * 2.0, v.normal));
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);

        assert!(ray.intersect_triangle(refs(&near), 0));
        assert!(!ray.intersect_triangle(refs(&far), 1));
        assert_eq!(ray.hit().unwrap().triangle, 0);

        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert!(ray.intersect_triangle(refs(&far), 1));
        assert!(ray.intersect_triangle(refs(&near), 0));
        assert_eq!(ray.hit().unwrap().triangle, 0);
    }

    #[test]
    fn test_limit_excludes_far_hits() {
        let tri = facing_z();
        let mut ray = Ray::with_limit(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 4.0);
        assert!(!ray.intersect_triangle(refs(&tri), 0));
    }

    #[test]
    fn test_interpolated_normal() {
        let tri = [
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(-1.0, 0.0, 1.0).normalize()),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 1.0).normalize()),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z),
        ];
        let mut ray = Ray::new(Vec3::new(0.9, -0.95, 5.0), -Vec3::Z);

        assert!(ray.intersect_triangle(refs(&tri), 0));
        let normal = ray.hit().unwrap().normal;
        assert!((normal.length() - 1.0).abs() < 1e-5);
        assert!(normal.x > 0.0);
    }

    #[test]
    fn test_degenerate_triangle() {
        let tri = [
            Vertex::new(Vec3::ZERO, Vec3::Z),
            Vertex::new(Vec3::X, Vec3::Z),
            Vertex::new(Vec3::X * 2.0, Vec3::Z),
        ];
        let mut ray = Ray::new(Vec3::new(0.5, 0.0, 5.0), -Vec3::Z);
        assert!(!ray.intersect_triangle(refs(&tri), 0));
    }

    #[test]
    fn test_disc() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        let t = ray.intersect_disc(Vec3::ZERO, Vec3::Y, 0.5).unwrap();
        assert!((t - 5.0).abs() < 1e-5);

        // Two-sided
        assert!(ray.intersect_disc(Vec3::ZERO, -Vec3::Y, 0.5).is_some());
        // Outside the radius
        let offset = Ray::new(Vec3::new(1.0, 5.0, 0.0), -Vec3::Y);
        assert!(offset.intersect_disc(Vec3::ZERO, Vec3::Y, 0.5).is_none());
        // Parallel
        let parallel = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(parallel.intersect_disc(Vec3::ZERO, Vec3::Y, 0.5).is_none());
    }

    #[test]
    fn test_box_entry_distance() {
        let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!((ray.intersect_box(&bounds).unwrap() - 16.0).abs() < 1e-4);

        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(inside.intersect_box(&bounds), Some(0.0));
    }
}
