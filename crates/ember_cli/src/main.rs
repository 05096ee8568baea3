//! Ember - render a demo scene to PNG.
//!
//! Usage: `ember [settings.json] [output.png]`

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ember_core::{Camera, Light, Material, Mesh, ObjectDesc, RenderSettings, SceneDesc};
use ember_math::{Color, Vec3};
use ember_renderer::{PixelBuffer, RenderEvent, RenderWorker, Renderer};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => RenderSettings::load(&path)
            .with_context(|| format!("Failed to load settings from {path}"))?,
        None => RenderSettings::default(),
    };
    let output = args.next().unwrap_or_else(|| "ember.png".to_string());

    log::info!("Starting Ember");
    let scene = build_scene()?;
    let renderer = Renderer::from_desc(&scene, settings)?;
    let camera = Camera::look_at(
        Vec3::new(0.0, 1.5, 7.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::Y,
        45.0,
        WIDTH,
        HEIGHT,
    );

    let mut worker = RenderWorker::new(renderer);
    worker.start(camera)?;

    loop {
        match worker.recv_event() {
            Some(RenderEvent::Progress(percent)) => log::info!("{percent:.0}%"),
            Some(RenderEvent::Finished { image, elapsed }) => {
                log::info!("Rendered in {elapsed:.2?}");
                save_png(&image, &output)?;
                log::info!("Saved to {output}");
                break;
            }
            Some(RenderEvent::Cancelled { .. }) => bail!("Render was cancelled"),
            Some(RenderEvent::Failed(err)) => return Err(err.into()),
            None => bail!("Render thread exited without a result"),
        }
    }

    worker.wait()?;
    Ok(())
}

/// A walled box with two blocks and a disc light under the ceiling.
fn build_scene() -> Result<SceneDesc> {
    let mut scene = SceneDesc::new();

    let white = scene.add_material(Material::matte(Color::splat(0.75)));
    let red = scene.add_material(Material::matte(Color::new(0.7, 0.1, 0.1)));
    let green = scene.add_material(Material::matte(Color::new(0.1, 0.6, 0.15)));
    let mirror = scene.add_material(Material::mirror(0.85));

    let walls = [
        ("floor", Mesh::quad("floor", Vec3::ZERO, Vec3::Z * 3.0, Vec3::X * 3.0)?, white),
        ("ceiling", Mesh::quad("ceiling", Vec3::Y * 3.0, Vec3::X * 3.0, Vec3::Z * 3.0)?, white),
        (
            "back",
            Mesh::quad("back", Vec3::new(0.0, 1.5, -3.0), Vec3::X * 3.0, Vec3::Y * 1.5)?,
            white,
        ),
        (
            "left",
            Mesh::quad("left", Vec3::new(-3.0, 1.5, 0.0), Vec3::Y * 1.5, Vec3::Z * 3.0)?,
            red,
        ),
        (
            "right",
            Mesh::quad("right", Vec3::new(3.0, 1.5, 0.0), Vec3::Z * 3.0, Vec3::Y * 1.5)?,
            green,
        ),
    ];
    for (name, mesh, material) in walls {
        scene.add_object(ObjectDesc::new(name, Arc::new(mesh), material));
    }

    let tall = Mesh::cuboid("tall_block", Vec3::new(-0.6, 0.0, -0.6), Vec3::new(0.6, 1.8, 0.6))?;
    scene.add_object(
        ObjectDesc::new("tall_block", Arc::new(tall), white).with_translation(Vec3::new(-1.2, 0.0, -1.0)),
    );

    let short = Mesh::cuboid("mirror_block", Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.9, 0.5))?;
    scene.add_object(
        ObjectDesc::new("mirror_block", Arc::new(short), mirror)
            .with_translation(Vec3::new(1.2, 0.0, 0.5))
            .with_motion(Vec3::new(0.3, 0.0, 0.0)),
    );

    scene.add_light(Light::area(
        Vec3::new(0.0, 2.9, 0.0),
        -Vec3::Y,
        0.6,
        Color::ONE,
        1.0,
    ));

    log::info!(
        "Built demo scene: {} objects, {} triangles",
        scene.objects.len(),
        scene.total_triangle_count()
    );
    Ok(scene)
}

fn save_png(image: &PixelBuffer, path: &str) -> Result<()> {
    let buffer = image::RgbImage::from_raw(image.width, image.height, image.data.clone())
        .context("Pixel buffer does not match its dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write {path}"))?;
    Ok(())
}
