//! Top-level render orchestration.
//!
//! A render runs one pass per motion-blur frame. Each pass shades every pixel
//! with its antialiasing and lens samples, accumulating into a running mean.
//! Rows are independent and shaded in parallel, each with its own seeded RNG.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ember_core::{Camera, FocusKind, RenderSettings, SceneDesc};
use ember_math::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::accumulator::{to_rgb8, ColorAccumulator};
use crate::pbgi::PointCloud;
use crate::progress::Progress;
use crate::sampling::{antialiasing_offsets, lens_offsets};
use crate::shading::ShadingContext;
use crate::{RenderError, RenderScene};

/// Final 8-bit RGB image, row-major from the top-left corner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Iterate over pixels as RGB triples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

/// Result of a render that may be cancelled.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Completed(PixelBuffer),
    /// The render was abandoned. `previous` is the last completed image.
    Cancelled { previous: Option<PixelBuffer> },
}

/// Owns the scene and settings, and renders images from a camera.
pub struct Renderer {
    scene: RenderScene,
    settings: RenderSettings,
    point_cloud: Option<PointCloud>,
    last_image: Option<PixelBuffer>,
}

impl Renderer {
    pub fn new(scene: RenderScene, settings: RenderSettings) -> Self {
        Self {
            scene,
            settings,
            point_cloud: None,
            last_image: None,
        }
    }

    /// Build the acceleration structures for `desc` and wrap them.
    pub fn from_desc(desc: &SceneDesc, settings: RenderSettings) -> Result<Self, RenderError> {
        Ok(Self::new(RenderScene::build(desc)?, settings))
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    /// Replace the scene. The point cloud is rebuilt on the next render.
    pub fn set_scene(&mut self, scene: RenderScene) {
        self.scene = scene;
        self.invalidate_point_cloud();
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace the settings, dropping the point cloud if it depends on what
    /// changed.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        if settings.point_gi != self.settings.point_gi || settings.shadow != self.settings.shadow {
            self.invalidate_point_cloud();
        }
        self.settings = settings;
    }

    pub fn invalidate_point_cloud(&mut self) {
        self.point_cloud = None;
    }

    pub fn point_cloud(&self) -> Option<&PointCloud> {
        self.point_cloud.as_ref()
    }

    /// The most recent completed image.
    pub fn last_image(&self) -> Option<&PixelBuffer> {
        self.last_image.as_ref()
    }

    /// Render a full image.
    pub fn render(&mut self, camera: &Camera) -> Result<PixelBuffer, RenderError> {
        let image = self.render_frames(camera, None, &|_| {})?;
        Ok(image.unwrap_or_default())
    }

    /// Render with a cancellation flag and progress callback.
    ///
    /// The flag is checked before every motion-blur frame, not inside one,
    /// so a cancelled render still finishes the frame it is working on.
    pub fn render_with(
        &mut self,
        camera: &Camera,
        cancel: &AtomicBool,
        on_progress: &(dyn Fn(f32) + Sync),
    ) -> Result<RenderOutcome, RenderError> {
        match self.render_frames(camera, Some(cancel), on_progress)? {
            Some(image) => Ok(RenderOutcome::Completed(image)),
            None => Ok(RenderOutcome::Cancelled {
                previous: self.last_image.clone(),
            }),
        }
    }

    /// `Ok(None)` when cancelled.
    fn render_frames(
        &mut self,
        camera: &Camera,
        cancel: Option<&AtomicBool>,
        on_progress: &(dyn Fn(f32) + Sync),
    ) -> Result<Option<PixelBuffer>, RenderError> {
        let (width, height) = (camera.width, camera.height);
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }

        let start = Instant::now();
        let seed = self.settings.seed.unwrap_or_else(rand::random);

        if self.settings.point_gi.enabled && self.point_cloud.is_none() {
            let mut rng = StdRng::seed_from_u64(seed);
            self.point_cloud = Some(PointCloud::build(&self.scene, &self.settings, &mut rng));
        }

        let frames = if self.scene.has_mobile_objects() {
            self.settings.motion_blur.frame_count.max(1)
        } else {
            1
        };
        log::info!(
            "Rendering {}x{}, {} frame(s), {} triangles",
            width,
            height,
            frames,
            self.scene.total_triangle_count()
        );

        let focus = &self.settings.focus;
        let lens = lens_offsets(focus.kind, focus.rays_per_lens, focus.aperture);
        let progress = Progress::new(frames as usize * height as usize, &self.settings.progress, on_progress);
        let mut pixels = vec![ColorAccumulator::new(); width as usize * height as usize];

        for frame in 0..frames {
            if cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                self.scene.reset_motion();
                log::info!("Render cancelled after {} of {} frame(s)", frame, frames);
                return Ok(None);
            }

            let ctx = ShadingContext::new(&self.scene, &self.settings)
                .with_point_cloud(self.point_cloud.as_ref());
            pixels
                .par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    let mut rng = StdRng::seed_from_u64(row_seed(seed, frame, y as u32));
                    for (x, pixel) in row.iter_mut().enumerate() {
                        render_pixel(&ctx, camera, x as u32, y as u32, &lens, pixel, &mut rng);
                    }
                    progress.advance(1);
                });

            if frame + 1 < frames {
                self.scene.advance_motion(frames);
            }
        }
        self.scene.reset_motion();

        let mut image = PixelBuffer::new(width, height);
        for (pixel, out) in pixels.iter().zip(image.data.chunks_exact_mut(3)) {
            out.copy_from_slice(&to_rgb8(pixel.mean()));
        }

        log::info!("Render finished in {:.2?}", start.elapsed());
        self.last_image = Some(image.clone());
        Ok(Some(image))
    }
}

/// Accumulate every sample of pixel (`x`, `y`).
fn render_pixel(
    ctx: &ShadingContext<'_>,
    camera: &Camera,
    x: u32,
    y: u32,
    lens: &[Vec2],
    pixel: &mut ColorAccumulator,
    rng: &mut dyn RngCore,
) {
    let settings = ctx.settings;
    let mut offsets = antialiasing_offsets(
        settings.antialiasing.kind,
        settings.antialiasing.rays_per_pixel,
        rng,
    );
    if offsets.is_empty() {
        offsets.push(Vec2::ZERO);
    }
    let depth_of_field = settings.focus.kind != FocusKind::None;

    for offset in offsets {
        let direction = camera.direction_through(x as f32 + offset.x, y as f32 + offset.y);

        let along_view = direction.dot(camera.view);
        if depth_of_field && along_view > f32::EPSILON {
            let focal_point = camera.position + direction * (settings.focus.focal_distance / along_view);
            for lens_offset in lens {
                let origin = camera.position + camera.right * lens_offset.x + camera.up * lens_offset.y;
                pixel.add(ctx.trace(origin, focal_point - origin, rng));
            }
        } else {
            pixel.add(ctx.trace(camera.position, direction, rng));
        }
    }
}

fn row_seed(seed: u64, frame: u32, row: u32) -> u64 {
    let key = (u64::from(frame) << 32) | u64::from(row);
    seed ^ key.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
