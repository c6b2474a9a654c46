//! Scene configuration loaded from TOML.
//!
//! Every section and field falls back to its default, so an empty file yields
//! the stock scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::path::Path;

/// Errors from configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How a vertex wave angle advances on each surface tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveAdvance {
    /// `angle += angular_speed * dt`; frame-rate independent.
    #[default]
    PerSecond,
    /// `angle += angular_speed` once per tick regardless of `dt`.
    PerFrame,
}

/// Ranges for the random per-vertex wave state drawn at surface creation.
///
/// Each value is `base + uniform[0, jitter)`, except the angle which is drawn
/// from `[0, angle_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveRanges {
    pub angle_max: f32,
    pub amplitude_base: f32,
    pub amplitude_jitter: f32,
    pub speed_base: f32,
    pub speed_jitter: f32,
}

impl Default for WaveRanges {
    fn default() -> Self {
        Self {
            angle_max: TAU,
            amplitude_base: 3.0,
            amplitude_jitter: 0.0001,
            speed_base: 0.001,
            speed_jitter: 0.0032,
        }
    }
}

/// Cylinder drum configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    /// Radians per second about the drum's long axis.
    pub rotation_speed: f32,
    /// Vertical placement of the drum centre in world space.
    pub offset_y: f32,
    pub advance: WaveAdvance,
    pub waves: WaveRanges,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            radius: 600.0,
            height: 800.0,
            radial_segments: 40,
            height_segments: 10,
            rotation_speed: 0.01,
            offset_y: -600.0,
            advance: WaveAdvance::default(),
            waves: WaveRanges::default(),
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius.is_nan() || self.radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "surface radius must be positive, got {}",
                self.radius
            )));
        }
        if self.height.is_nan() || self.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "surface height must be positive, got {}",
                self.height
            )));
        }
        if self.radial_segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "radial_segments must be at least 3, got {}",
                self.radial_segments
            )));
        }
        if self.height_segments < 1 {
            return Err(ConfigError::Invalid(
                "height_segments must be at least 1".into(),
            ));
        }
        if !self.rotation_speed.is_finite() || !self.offset_y.is_finite() {
            return Err(ConfigError::Invalid(
                "surface rotation_speed and offset_y must be finite".into(),
            ));
        }
        self.waves.validate()
    }
}

impl WaveRanges {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("angle_max", self.angle_max),
            ("amplitude_base", self.amplitude_base),
            ("amplitude_jitter", self.amplitude_jitter),
            ("speed_base", self.speed_base),
            ("speed_jitter", self.speed_jitter),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "wave {name} must be finite, got {value}"
            )));
        }
        if self.angle_max <= 0.0 || self.angle_max > TAU {
            return Err(ConfigError::Invalid(format!(
                "wave angle_max must be in (0, 2π], got {}",
                self.angle_max
            )));
        }
        if self.amplitude_jitter < 0.0 || self.speed_jitter < 0.0 {
            return Err(ConfigError::Invalid(
                "wave jitter must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Player rig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub yaw: f32,
    /// Camera position in the rig's local frame.
    pub camera_offset: Vec3,
    /// Height above the rig origin the camera looks at.
    pub look_height: f32,
    pub model_path: String,
    /// Clip started in a loop once the model loads, if the bundle has it.
    pub clip_index: usize,
    /// Loaded meshes are scaled so their bounds are this tall.
    pub fit_height: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: FRAC_PI_2,
            camera_offset: Vec3::new(0.0, 2.0, -4.0),
            look_height: 1.0,
            model_path: "Xbot.glb".into(),
            clip_index: 6,
            fit_height: 1.8,
        }
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

/// A cone light placed in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLightConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub color: u32,
    pub intensity: f32,
    /// Range after which the light contributes nothing; 0 means unlimited.
    pub distance: f32,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone over which the edge fades, 0..=1.
    pub penumbra: f32,
}

impl Default for SpotLightConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 0.0, 4.0),
            target: Vec3::ZERO,
            color: 0xdddddd,
            intensity: 500.0,
            distance: 1000.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
        }
    }
}

/// Scene lighting: one ambient term plus a world spot light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub spot: SpotLightConfig,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.3,
            spot: SpotLightConfig::default(),
        }
    }
}

/// Full scene configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub surface: SurfaceConfig,
    pub rig: RigConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig {
                radial_segments: 140,
                height_segments: 110,
                ..SurfaceConfig::default()
            },
            rig: RigConfig::default(),
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.surface.validate()?;
        let camera = &self.camera;
        if camera.near.is_nan() || camera.near <= 0.0 || camera.far <= camera.near {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                self.camera.near, self.camera.far
            )));
        }
        if self.rig.fit_height.is_nan() || self.rig.fit_height <= 0.0 {
            return Err(ConfigError::Invalid("rig fit_height must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.surface.radial_segments, 140);
        assert_eq!(config.surface.height_segments, 110);
        assert_eq!(config.rig.clip_index, 6);
        assert_eq!(config.rig.camera_offset, Vec3::new(0.0, 2.0, -4.0));
    }

    #[test]
    fn surface_defaults_are_standalone_values() {
        let s = SurfaceConfig::default();
        assert_eq!(s.radial_segments, 40);
        assert_eq!(s.height_segments, 10);
        assert_eq!(s.rotation_speed, 0.01);
        assert_eq!(s.advance, WaveAdvance::PerSecond);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [surface]
            radius = 50.0
            advance = "per_frame"

            [surface.waves]
            amplitude_base = 1.5

            [rig]
            camera_offset = [0.0, 5.0, -10.0]
        "#;
        let config = SceneConfig::from_toml_str(text).unwrap();
        assert_eq!(config.surface.radius, 50.0);
        assert_eq!(config.surface.height, 800.0);
        assert_eq!(config.surface.advance, WaveAdvance::PerFrame);
        assert_eq!(config.surface.waves.amplitude_base, 1.5);
        assert_eq!(config.surface.waves.speed_base, 0.001);
        assert_eq!(config.rig.camera_offset, Vec3::new(0.0, 5.0, -10.0));
        assert_eq!(config.rig.model_path, "Xbot.glb");
    }

    #[test]
    fn rejects_degenerate_surface() {
        let err = SceneConfig::from_toml_str("[surface]\nradial_segments = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SceneConfig::from_toml_str("[surface]\nradius = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_finite_wave_ranges() {
        for text in [
            "[surface.waves]\nangle_max = inf\n",
            "[surface.waves]\nspeed_jitter = nan\n",
            "[surface.waves]\namplitude_base = -inf\n",
            "[surface]\nrotation_speed = nan\n",
            "[surface]\noffset_y = inf\n",
        ] {
            let err = SceneConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "accepted {text:?}");
        }
    }

    #[test]
    fn wave_angle_max_must_be_within_one_turn() {
        for angle_max in ["0.0", "7.0", "-1.0"] {
            let text = format!("[surface.waves]\nangle_max = {angle_max}\n");
            let err = SceneConfig::from_toml_str(&text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }
        let text = "[surface.waves]\nangle_max = 1.0\n";
        assert!(SceneConfig::from_toml_str(text).is_ok());
    }

    #[test]
    fn rejects_bad_camera_planes() {
        let err = SceneConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = SceneConfig::from_toml_str("[surface\nradius = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = SceneConfig::default();
        config.surface.rotation_speed = 0.25;
        config.rig.clip_index = 2;
        config.save(tmp.path()).unwrap();

        let loaded = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SceneConfig::load("/nonexistent/tumbler.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
