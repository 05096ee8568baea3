use ember_math::Vec3;
use serde::{Deserialize, Serialize};

/// Camera descriptor supplied by the host.
///
/// `view`, `up` and `right` form the camera basis; `fov_degrees` is the
/// vertical field of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub view: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub fov_degrees: f32,
    pub aspect_ratio: f32,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    /// Build an orthonormal camera looking from `position` at `target`.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, fov_degrees: f32, width: u32, height: u32) -> Self {
        let view = (target - position).normalize_or_zero();
        let right = view.cross(up).normalize_or_zero();
        let up = right.cross(view);
        Self {
            position,
            view,
            up,
            right,
            fov_degrees,
            aspect_ratio: width as f32 / height.max(1) as f32,
            width,
            height,
        }
    }

    /// Per-pixel steps along `right` and `up` on the image plane at unit distance.
    pub fn pixel_steps(&self) -> (f32, f32) {
        let half_height = (self.fov_degrees.to_radians() * 0.5).tan();
        let half_width = half_height * self.aspect_ratio;
        (
            2.0 * half_width / self.width.max(1) as f32,
            2.0 * half_height / self.height.max(1) as f32,
        )
    }

    /// Unnormalized primary direction through image position (`px`, `py`),
    /// measured in pixels from the top-left corner.
    pub fn direction_through(&self, px: f32, py: f32) -> Vec3 {
        let (step_x, step_y) = self.pixel_steps();
        let dx = (px - self.width as f32 * 0.5) * step_x;
        let dy = (py - self.height as f32 * 0.5) * step_y;
        self.view + self.right * dx - self.up * dy
    }
}
