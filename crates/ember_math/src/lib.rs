// Re-export glam for convenience
pub use glam::*;

mod bounds;
pub mod directions;

pub use bounds::{BoundingBox, BOX_EPSILON};

/// Linear RGB color, components nominally in 0-1.
pub type Color = Vec3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a[2], 3.0);
    }
}
