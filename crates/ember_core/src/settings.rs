//! Runtime render parameters.
//!
//! Every group carries `#[serde(default)]`, so a settings file only needs to
//! mention what it changes.

use std::path::Path;

use ember_math::Color;
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntialiasingKind {
    #[default]
    None,
    Uniform,
    Polygonal,
    Stochastic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    None,
    #[default]
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusKind {
    #[default]
    None,
    Uniform,
    Stochastic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntialiasingSettings {
    pub kind: AntialiasingKind,
    pub rays_per_pixel: u32,
}

impl Default for AntialiasingSettings {
    fn default() -> Self {
        Self {
            kind: AntialiasingKind::None,
            rays_per_pixel: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub mode: ShadowMode,
    /// Rays per light for soft shadows.
    pub rays_per_light: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            mode: ShadowMode::Hard,
            rays_per_light: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    /// Zero disables ambient occlusion.
    pub rays_per_point: u32,
    pub max_angle_degrees: f32,
    pub radius: f32,
    pub intensity: f32,
    /// Output the occlusion term alone, as grey.
    pub only_ao: bool,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            rays_per_point: 0,
            max_angle_degrees: 80.0,
            radius: 1.0,
            intensity: 1.0,
            only_ao: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTracingSettings {
    /// Zero disables indirect lighting.
    pub max_depth: u32,
    pub rays_per_bounce: u32,
    pub max_angle_degrees: f32,
    pub intensity: f32,
    /// Output indirect light only.
    pub only_pt: bool,
}

impl Default for PathTracingSettings {
    fn default() -> Self {
        Self {
            max_depth: 0,
            rays_per_bounce: 8,
            max_angle_degrees: 80.0,
            intensity: 1.0,
            only_pt: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusSettings {
    pub kind: FocusKind,
    pub rays_per_lens: u32,
    pub aperture: f32,
    /// Distance from the camera to the plane in perfect focus.
    pub focal_distance: f32,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            kind: FocusKind::None,
            rays_per_lens: 4,
            aperture: 0.1,
            focal_distance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    pub frame_count: u32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self { frame_count: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointGiSettings {
    pub enabled: bool,
    /// Cube-face grid resolution used when shooting surfels from each light.
    pub light_resolution: u32,
    /// Cube-face grid resolution used when gathering at a shading point.
    pub gather_resolution: u32,
    /// Longest gather ray.
    pub max_distance: f32,
}

impl Default for PointGiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            light_resolution: 64,
            gather_resolution: 4,
            max_distance: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    /// Reflection/refraction bounces before falling back to the background.
    pub max_depth: u32,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    pub min_percent_delta: f32,
    pub min_interval_ms: u64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            min_percent_delta: 1.0,
            min_interval_ms: 250,
        }
    }
}

/// The full configuration surface of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub antialiasing: AntialiasingSettings,
    pub shadow: ShadowSettings,
    pub ambient_occlusion: AmbientOcclusionSettings,
    pub path_tracing: PathTracingSettings,
    pub focus: FocusSettings,
    pub motion_blur: MotionBlurSettings,
    pub point_gi: PointGiSettings,
    pub mirror: MirrorSettings,
    pub progress: ProgressSettings,
    pub background: Color,
    /// Fixed seed for reproducible stochastic sampling.
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            antialiasing: AntialiasingSettings::default(),
            shadow: ShadowSettings::default(),
            ambient_occlusion: AmbientOcclusionSettings::default(),
            path_tracing: PathTracingSettings::default(),
            focus: FocusSettings::default(),
            motion_blur: MotionBlurSettings::default(),
            point_gi: PointGiSettings::default(),
            mirror: MirrorSettings::default(),
            progress: ProgressSettings::default(),
            background: Color::ZERO,
            seed: None,
        }
    }
}

impl RenderSettings {
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("Loaded render settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = RenderSettings::from_json_str(
            r#"{
                "antialiasing": { "kind": "stochastic" },
                "shadow": { "mode": "soft", "rays_per_light": 32 },
                "background": [0.2, 0.3, 0.4]
            }"#,
        )
        .unwrap();

        assert_eq!(settings.antialiasing.kind, AntialiasingKind::Stochastic);
        assert_eq!(settings.antialiasing.rays_per_pixel, 4);
        assert_eq!(settings.shadow.mode, ShadowMode::Soft);
        assert_eq!(settings.shadow.rays_per_light, 32);
        assert_eq!(settings.background, Color::new(0.2, 0.3, 0.4));
        assert_eq!(settings.motion_blur, MotionBlurSettings::default());
    }

    #[test]
    fn test_json_roundtrip_preserves_settings() {
        let mut settings = RenderSettings::default();
        settings.focus.kind = FocusKind::Uniform;
        settings.seed = Some(42);

        let json = settings.to_json().unwrap();
        assert_eq!(RenderSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = RenderSettings::from_json_str(r#"{ "shadow": { "mode": "fuzzy" } }"#).unwrap_err();
        assert!(matches!(err, crate::SceneError::Settings(_)));
    }
}
