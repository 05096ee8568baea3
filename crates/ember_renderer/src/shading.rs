//! Color of a ray: material dispatch and the lighting terms.

use ember_core::{Material, RenderSettings, Surface};
use ember_math::directions::{reflect, refract, schlick};
use ember_math::{Color, Vec3};
use rand::RngCore;

use crate::ambient_occlusion::ambient_occlusion;
use crate::brdf::{self, BrdfTerms, LightSample};
use crate::pbgi::PointCloud;
use crate::shadow::light_visibility;
use crate::{path_tracer, RayHit, RenderScene};

/// Everything shading needs for one frame, borrowed from the renderer.
#[derive(Clone, Copy)]
pub struct ShadingContext<'a> {
    pub scene: &'a RenderScene,
    pub settings: &'a RenderSettings,
    /// Point cloud for point-based GI, when enabled and built.
    pub point_cloud: Option<&'a PointCloud>,
}

impl<'a> ShadingContext<'a> {
    pub fn new(scene: &'a RenderScene, settings: &'a RenderSettings) -> Self {
        Self {
            scene,
            settings,
            point_cloud: None,
        }
    }

    pub fn with_point_cloud(mut self, point_cloud: Option<&'a PointCloud>) -> Self {
        self.point_cloud = point_cloud;
        self
    }

    /// Color seen along a primary ray.
    pub fn trace(&self, origin: Vec3, direction: Vec3, rng: &mut dyn RngCore) -> Color {
        if !self.scene.has_enabled_lights() && !self.settings.ambient_occlusion.only_ao {
            return self.settings.background;
        }
        self.trace_depth(origin, direction, 0, rng)
    }

    fn trace_depth(&self, origin: Vec3, direction: Vec3, depth: u32, rng: &mut dyn RngCore) -> Color {
        let Some(hit) = self.scene.intersect(origin, direction, false) else {
            return self.settings.background;
        };
        let Some(material) = self.scene.material_of(&hit) else {
            return self.settings.background;
        };
        let view = -direction.normalize_or_zero();

        match material {
            Material::SkyBox { color } => *color,
            Material::Phong(surface) => self.shade_surface(surface, &hit, view, rng),
            Material::Mirror {
                surface,
                reflectance,
            } => {
                let local = self.shade_surface(surface, &hit, view, rng);
                let bounce = self.continue_ray(hit.position, reflect(-view, hit.normal), depth, rng);
                local + bounce * *reflectance
            }
            Material::Glass {
                surface,
                ior,
                transparency,
            } => {
                let local = self.shade_surface(surface, &hit, view, rng);
                let incoming = -view;
                let eta = 1.0 / ior.max(f32::EPSILON);
                let cos_theta = view.dot(hit.normal).clamp(0.0, 1.0);
                let reflected = self.continue_ray(hit.position, reflect(incoming, hit.normal), depth, rng);

                let through = match refract(incoming, hit.normal, eta) {
                    Some(refracted) => {
                        let fresnel = schlick(cos_theta, eta);
                        let transmitted = self.continue_ray(hit.position, refracted, depth, rng);
                        reflected * fresnel + transmitted * (1.0 - fresnel)
                    }
                    None => reflected,
                };
                local + through * *transparency
            }
        }
    }

    /// Follow a reflected or refracted ray, stopping at the mirror depth cap.
    fn continue_ray(&self, origin: Vec3, direction: Vec3, depth: u32, rng: &mut dyn RngCore) -> Color {
        if depth + 1 > self.settings.mirror.max_depth {
            return self.settings.background;
        }
        self.trace_depth(origin, direction, depth + 1, rng)
    }

    /// Full local shading of a surface point.
    fn shade_surface(&self, surface: &Surface, hit: &RayHit, view: Vec3, rng: &mut dyn RngCore) -> Color {
        let (point, normal) = (hit.position, hit.normal);
        let ao_settings = &self.settings.ambient_occlusion;

        if ao_settings.only_ao {
            return Color::splat(ambient_occlusion(self.scene, point, normal, ao_settings, rng));
        }

        let mut indirect = Vec::new();
        if self.settings.path_tracing.max_depth > 0 {
            indirect.extend(path_tracer::gather(self, point, normal, 0, rng));
        }
        if let Some(cloud) = self.point_cloud {
            indirect.extend(cloud.gather(point, normal, self.settings));
        }

        let indirect_color = brdf::reflected(surface, BrdfTerms::DIFFUSE, point, normal, view, &indirect);
        if self.settings.path_tracing.only_pt {
            return indirect_color;
        }

        let occlusion = ambient_occlusion(self.scene, point, normal, ao_settings, rng);
        let lights = self.direct_lights(point, rng);
        brdf::evaluate(surface, BrdfTerms::ALL, occlusion, point, normal, view, &lights) + indirect_color
    }

    /// Enabled scene lights with their intensity scaled by visibility from `point`.
    pub fn direct_lights(&self, point: Vec3, rng: &mut dyn RngCore) -> Vec<LightSample> {
        self.scene
            .enabled_lights()
            .filter_map(|light| {
                let visibility = light_visibility(self.scene, point, light, &self.settings.shadow, rng);
                (visibility > 0.0).then(|| LightSample {
                    position: light.position,
                    color: light.color,
                    intensity: light.intensity * visibility,
                })
            })
            .collect()
    }

    /// Diffuse response of `surface` to the scene's lights only, as used for
    /// bounce points and surfels.
    pub fn direct_diffuse(&self, surface: &Surface, hit: &RayHit, view: Vec3, rng: &mut dyn RngCore) -> Color {
        let lights = self.direct_lights(hit.position, rng);
        brdf::reflected(surface, BrdfTerms::DIFFUSE, hit.position, hit.normal, view, &lights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Light, Mesh, ObjectDesc, SceneDesc, ShadowMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn floor_scene(material: Material, lights: Vec<Light>) -> RenderScene {
        let mut desc = SceneDesc::new();
        let id = desc.add_material(material);
        // Faces +Z.
        let quad = Mesh::quad("floor", Vec3::ZERO, Vec3::X * 10.0, Vec3::Y * 10.0).unwrap();
        desc.add_object(ObjectDesc::new("floor", Arc::new(quad), id));
        for light in lights {
            desc.add_light(light);
        }
        RenderScene::build(&desc).unwrap()
    }

    fn overhead_light() -> Light {
        Light::point(Vec3::new(0.0, 0.0, 5.0), Color::ONE, 1.0)
    }

    #[test]
    fn test_no_lights_gives_background() {
        let scene = floor_scene(Material::matte(Color::ONE), Vec::new());
        let settings = RenderSettings {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        let c = ctx.trace(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, &mut rng);
        assert_eq!(c, settings.background);
    }

    #[test]
    fn test_miss_gives_background() {
        let scene = floor_scene(Material::matte(Color::ONE), vec![overhead_light()]);
        let settings = RenderSettings {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(ctx.trace(Vec3::new(0.0, 0.0, 3.0), Vec3::Z, &mut rng), settings.background);
    }

    #[test]
    fn test_lit_matte_floor() {
        let surface = Surface::matte(Color::ONE);
        let scene = floor_scene(Material::Phong(surface.clone()), vec![overhead_light()]);
        let settings = RenderSettings::default();
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        let c = ctx.trace(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, &mut rng);
        let expected = surface.ambient_color * surface.ambient + surface.diffuse_color * surface.diffuse;
        assert!((c - expected).length() < 1e-4, "{c:?} vs {expected:?}");
    }

    #[test]
    fn test_skybox_is_unlit() {
        let sky = Color::new(0.3, 0.6, 0.9);
        let scene = floor_scene(Material::SkyBox { color: sky }, vec![overhead_light()]);
        let settings = RenderSettings::default();
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(ctx.trace(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, &mut rng), sky);
    }

    #[test]
    fn test_only_ao_renders_grey() {
        let scene = floor_scene(Material::matte(Color::ONE), Vec::new());
        let mut settings = RenderSettings::default();
        settings.ambient_occlusion.only_ao = true;
        settings.ambient_occlusion.intensity = 0.7;
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        let c = ctx.trace(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, &mut rng);
        assert_eq!(c, Color::splat(0.7));
    }

    #[test]
    fn test_mirror_depth_is_capped() {
        // Two facing mirrors: without a cap this would never end.
        let mut desc = SceneDesc::new();
        let mirror = desc.add_material(Material::mirror(1.0));
        let bottom = Mesh::quad("bottom", Vec3::ZERO, Vec3::X * 10.0, Vec3::Y * 10.0).unwrap();
        let top = Mesh::quad("top", Vec3::new(0.0, 0.0, 2.0), Vec3::Y * 10.0, Vec3::X * 10.0).unwrap();
        desc.add_object(ObjectDesc::new("bottom", Arc::new(bottom), mirror));
        desc.add_object(ObjectDesc::new("top", Arc::new(top), mirror));
        desc.add_light(Light::point(Vec3::new(50.0, 0.0, 1.0), Color::ONE, 1.0));
        let scene = RenderScene::build(&desc).unwrap();

        let mut settings = RenderSettings::default();
        settings.mirror.max_depth = 4;
        settings.shadow.mode = ShadowMode::None;
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        let c = ctx.trace(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z, &mut rng);
        assert!(c.is_finite());
    }

    #[test]
    fn test_shadowed_point_gets_ambient_only() {
        let surface = Surface::matte(Color::ONE);
        let mut desc = SceneDesc::new();
        let id = desc.add_material(Material::Phong(surface.clone()));
        let floor = Mesh::quad("floor", Vec3::ZERO, Vec3::X * 10.0, Vec3::Y * 10.0).unwrap();
        let blocker = Mesh::quad("blocker", Vec3::new(0.0, 0.0, 2.0), Vec3::Y, Vec3::X).unwrap();
        desc.add_object(ObjectDesc::new("floor", Arc::new(floor), id));
        desc.add_object(ObjectDesc::new("blocker", Arc::new(blocker), id));
        desc.add_light(overhead_light());
        let scene = RenderScene::build(&desc).unwrap();

        let settings = RenderSettings::default();
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        // Look at the floor from the side, under the blocker.
        let eye = Vec3::new(3.0, 0.0, 1.0);
        let c = ctx.trace(eye, Vec3::new(0.0, 0.0, 0.0) - eye, &mut rng);
        assert!((c - surface.ambient_color * surface.ambient).length() < 1e-4, "{c:?}");
    }

    /// A floor facing up under a ceiling facing down, lit from between them.
    fn room() -> RenderScene {
        let mut desc = SceneDesc::new();
        let id = desc.add_material(Material::matte(Color::ONE));
        let floor = Mesh::quad("floor", Vec3::ZERO, Vec3::X * 12.0, Vec3::Y * 12.0).unwrap();
        let ceiling = Mesh::quad("ceiling", Vec3::new(0.0, 0.0, 2.0), Vec3::Y * 12.0, Vec3::X * 12.0).unwrap();
        desc.add_object(ObjectDesc::new("floor", Arc::new(floor), id));
        desc.add_object(ObjectDesc::new("ceiling", Arc::new(ceiling), id));
        desc.add_light(Light::point(Vec3::new(0.0, 0.0, 1.0), Color::ONE, 1.0));
        RenderScene::build(&desc).unwrap()
    }

    #[test]
    fn test_only_pt_without_bounce_surfaces_is_black() {
        let scene = floor_scene(Material::matte(Color::ONE), vec![overhead_light()]);
        let mut settings = RenderSettings::default();
        settings.path_tracing.max_depth = 1;
        settings.path_tracing.only_pt = true;
        let ctx = ShadingContext::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(ctx.trace(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_only_pt_returns_the_indirect_part() {
        let scene = room();
        let mut settings = RenderSettings::default();
        settings.path_tracing.max_depth = 1;
        settings.path_tracing.rays_per_bounce = 16;
        let eye = Vec3::new(0.0, 0.0, 1.5);

        let full = ShadingContext::new(&scene, &settings).trace(eye, -Vec3::Z, &mut StdRng::seed_from_u64(5));
        settings.path_tracing.only_pt = true;
        let indirect = ShadingContext::new(&scene, &settings).trace(eye, -Vec3::Z, &mut StdRng::seed_from_u64(5));

        // Direct light at the floor point is 0.8 from straight above plus 0.1 ambient.
        assert!(indirect.min_element() > 0.0, "{indirect:?}");
        assert!((full - indirect - Color::splat(0.9)).length() < 1e-4, "{full:?} vs {indirect:?}");
    }

    #[test]
    fn test_surfel_gather_adds_light() {
        let scene = room();
        let mut settings = RenderSettings::default();
        settings.point_gi.enabled = true;
        settings.point_gi.light_resolution = 6;
        settings.point_gi.gather_resolution = 4;
        let cloud = PointCloud::build(&scene, &settings, &mut StdRng::seed_from_u64(0));
        assert!(!cloud.gather(Vec3::ZERO, Vec3::Z, &settings).is_empty());

        let eye = Vec3::new(0.0, 0.0, 1.5);
        let plain = ShadingContext::new(&scene, &settings).trace(eye, -Vec3::Z, &mut StdRng::seed_from_u64(1));
        let gathered = ShadingContext::new(&scene, &settings)
            .with_point_cloud(Some(&cloud))
            .trace(eye, -Vec3::Z, &mut StdRng::seed_from_u64(1));

        assert!((plain - Color::splat(0.9)).length() < 1e-4, "{plain:?}");
        assert!(gathered.min_element() > plain.min_element(), "{gathered:?} vs {plain:?}");
    }
}
