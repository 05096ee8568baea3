use ember_math::Color;

/// Running mean of color samples.
///
/// Every sample counts, including black ones, so a pixel where only some
/// samples see light comes out correspondingly darker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorAccumulator {
    sum: Color,
    count: u32,
}

impl ColorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, color: Color) {
        self.sum += color;
        self.count += 1;
    }

    /// Mean of everything added so far, black when empty.
    pub fn mean(&self) -> Color {
        if self.count == 0 {
            Color::ZERO
        } else {
            self.sum / self.count as f32
        }
    }
}

/// Scale a linear color to 8-bit, clamping out-of-range channels.
#[inline]
pub fn to_rgb8(color: Color) -> [u8; 3] {
    let channel = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}
