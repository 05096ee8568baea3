use ember_math::{Color, Vec3};

use crate::Ray;

/// A lit surface patch stored as a disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surfel {
    pub position: Vec3,
    pub normal: Vec3,
    pub radius: f32,
    /// Direct diffuse lighting integrated over the patch.
    pub color: Color,
    /// Scene object the patch was sampled from.
    pub object: Option<usize>,
}

impl Surfel {
    pub fn new(position: Vec3, normal: Vec3, radius: f32, color: Color) -> Self {
        Self {
            position,
            normal: normal.normalize_or_zero(),
            radius,
            color,
            object: None,
        }
    }

    pub fn with_object(mut self, object: Option<usize>) -> Self {
        self.object = object;
        self
    }

    /// Distance along `ray` to this surfel's disc.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_disc(self.position, self.normal, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_is_two_sided() {
        let surfel = Surfel::new(Vec3::ZERO, Vec3::Z, 0.5, Color::ONE);

        let from_above = Ray::new(Vec3::new(0.2, 0.0, 3.0), -Vec3::Z);
        let from_below = Ray::new(Vec3::new(0.2, 0.0, -3.0), Vec3::Z);
        assert!((surfel.intersect(&from_above).unwrap() - 3.0).abs() < 1e-5);
        assert!((surfel.intersect(&from_below).unwrap() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_disc_edge_and_parallel() {
        let surfel = Surfel::new(Vec3::ZERO, Vec3::Z, 0.5, Color::ONE);

        assert!(surfel.intersect(&Ray::new(Vec3::new(0.6, 0.0, 3.0), -Vec3::Z)).is_none());
        assert!(surfel.intersect(&Ray::new(Vec3::new(-3.0, 0.0, 0.0), Vec3::X)).is_none());
    }
}
