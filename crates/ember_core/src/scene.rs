//! Scene description types supplied to the renderer.
//!
//! This is the renderer-agnostic side of the scene: meshes, materials,
//! lights and per-object transforms. The renderer builds its acceleration
//! structures from a [`SceneDesc`].

use std::sync::Arc;

use ember_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::mesh::Mesh;

/// Phong surface parameters shared by every material kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub ambient_color: Color,
    pub diffuse_color: Color,
    pub specular_color: Color,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            ambient_color: Color::splat(0.5),
            diffuse_color: Color::splat(0.5),
            specular_color: Color::ONE,
            ambient: 0.1,
            diffuse: 0.8,
            specular: 0.2,
            shininess: 32.0,
        }
    }
}

impl Surface {
    /// A matte surface of the given color.
    pub fn matte(color: Color) -> Self {
        Self {
            ambient_color: color,
            diffuse_color: color,
            specular: 0.0,
            ..Default::default()
        }
    }
}

/// The closed set of material kinds the shading pipeline knows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    /// Ambient + Lambertian + Phong specular.
    Phong(Surface),
    /// Phong specular highlight plus a traced reflection.
    Mirror { surface: Surface, reflectance: f32 },
    /// Thin refractor with Schlick-weighted reflection.
    Glass {
        surface: Surface,
        ior: f32,
        transparency: f32,
    },
    /// Environment geometry, shown unlit in a fixed color.
    SkyBox { color: Color },
}

impl Default for Material {
    fn default() -> Self {
        Material::Phong(Surface::default())
    }
}

impl Material {
    pub fn matte(color: Color) -> Self {
        Material::Phong(Surface::matte(color))
    }

    pub fn mirror(reflectance: f32) -> Self {
        Material::Mirror {
            surface: Surface {
                diffuse: 0.0,
                ambient: 0.0,
                specular: 0.5,
                shininess: 64.0,
                ..Default::default()
            },
            reflectance: reflectance.clamp(0.0, 1.0),
        }
    }

    pub fn glass(ior: f32) -> Self {
        Material::Glass {
            surface: Surface {
                diffuse: 0.0,
                ambient: 0.0,
                specular: 0.5,
                shininess: 96.0,
                ..Default::default()
            },
            ior,
            transparency: 0.9,
        }
    }

    /// Phong parameters, `None` for environment surfaces.
    pub fn surface(&self) -> Option<&Surface> {
        match self {
            Material::Phong(surface)
            | Material::Mirror { surface, .. }
            | Material::Glass { surface, .. } => Some(surface),
            Material::SkyBox { .. } => None,
        }
    }

    /// Mirror and glass surfaces reflect the scene rather than scatter light.
    pub fn is_glossy(&self) -> bool {
        matches!(self, Material::Mirror { .. } | Material::Glass { .. })
    }

    pub fn is_environment(&self) -> bool {
        matches!(self, Material::SkyBox { .. })
    }
}

/// A point light, or a disc-shaped area light when `radius > 0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    /// Disc radius, zero for a point light.
    pub radius: f32,
    /// Disc orientation; also the emitting hemisphere for point-cloud sampling.
    pub normal: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub enabled: bool,
}

impl Light {
    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            position,
            radius: 0.0,
            normal: Vec3::ZERO,
            color,
            intensity,
            enabled: true,
        }
    }

    pub fn area(position: Vec3, normal: Vec3, radius: f32, color: Color, intensity: f32) -> Self {
        Self {
            position,
            radius: radius.max(0.0),
            normal: normal.normalize_or_zero(),
            color,
            intensity,
            enabled: true,
        }
    }

    pub fn is_area(&self) -> bool {
        self.radius > 0.0 && self.normal != Vec3::ZERO
    }
}

/// One renderable object: a mesh, a material reference and its placement.
#[derive(Clone, Debug)]
pub struct ObjectDesc {
    pub name: String,
    pub mesh: Arc<Mesh>,
    /// Index into [`SceneDesc::materials`].
    pub material: usize,
    pub translation: Vec3,
    /// Total displacement over the motion-blur interval, if the object moves.
    pub motion: Option<Vec3>,
    pub enabled: bool,
}

impl ObjectDesc {
    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>, material: usize) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            translation: Vec3::ZERO,
            motion: None,
            enabled: true,
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_motion(mut self, motion: Vec3) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn is_mobile(&self) -> bool {
        self.motion.is_some_and(|m| m != Vec3::ZERO)
    }
}

/// A complete scene: objects, shared materials and lights.
#[derive(Clone, Debug, Default)]
pub struct SceneDesc {
    pub objects: Vec<ObjectDesc>,
    pub materials: Vec<Arc<Material>>,
    pub lights: Vec<Light>,
}

impl SceneDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(Arc::new(material));
        self.materials.len() - 1
    }

    pub fn add_object(&mut self, object: ObjectDesc) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn material(&self, id: usize) -> Option<&Arc<Material>> {
        self.materials.get(id)
    }

    /// Check every object's material reference.
    pub fn validate(&self) -> SceneResult<()> {
        for object in &self.objects {
            if object.material >= self.materials.len() {
                return Err(SceneError::MissingMaterial {
                    object: object.name.clone(),
                    material: object.material,
                });
            }
        }
        Ok(())
    }

    pub fn total_triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.triangle_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> Arc<Mesh> {
        Arc::new(
            Mesh::from_positions("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
                .unwrap(),
        )
    }

    #[test]
    fn test_scene_creation() {
        let mut scene = SceneDesc::new();
        let red = scene.add_material(Material::matte(Color::new(1.0, 0.0, 0.0)));
        scene.add_object(ObjectDesc::new("a", triangle_mesh(), red));
        scene.add_object(
            ObjectDesc::new("b", triangle_mesh(), red).with_translation(Vec3::new(1.0, 0.0, 0.0)),
        );

        assert_eq!(scene.total_triangle_count(), 2);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_missing_material() {
        let mut scene = SceneDesc::new();
        scene.add_object(ObjectDesc::new("orphan", triangle_mesh(), 3));

        let err = scene.validate().unwrap_err();
        assert!(matches!(err, SceneError::MissingMaterial { material: 3, .. }));
    }

    #[test]
    fn test_material_classification() {
        assert!(Material::mirror(0.9).is_glossy());
        assert!(Material::glass(1.5).is_glossy());
        assert!(!Material::matte(Color::ONE).is_glossy());
        assert!(Material::SkyBox { color: Color::ONE }.is_environment());
        assert!(Material::SkyBox { color: Color::ONE }.surface().is_none());
    }

    #[test]
    fn test_mobile_objects() {
        let still = ObjectDesc::new("still", triangle_mesh(), 0);
        let zero = ObjectDesc::new("zero", triangle_mesh(), 0).with_motion(Vec3::ZERO);
        let moving = ObjectDesc::new("moving", triangle_mesh(), 0).with_motion(Vec3::X);

        assert!(!still.is_mobile());
        assert!(!zero.is_mobile());
        assert!(moving.is_mobile());
    }

    #[test]
    fn test_area_light() {
        let light = Light::area(Vec3::Y, Vec3::new(0.0, -2.0, 0.0), 0.5, Color::ONE, 1.0);
        assert!(light.is_area());
        assert_eq!(light.normal, -Vec3::Y);
        assert!(!Light::point(Vec3::Y, Color::ONE, 1.0).is_area());
    }
}
