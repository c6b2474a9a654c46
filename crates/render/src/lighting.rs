use glam::Vec3;
use tumbler_common::{LightingConfig, SpotLightConfig, rgb_hex};
use tumbler_scene::Scene;

/// A cone light resolved into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    /// Unit vector the cone points along.
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub distance: f32,
    /// Cosine of the cone half-angle.
    pub cos_outer: f32,
    /// Cosine of the angle where the penumbra fade begins.
    pub cos_inner: f32,
}

impl SpotLight {
    pub fn new(
        position: Vec3,
        target: Vec3,
        color: u32,
        intensity: f32,
        distance: f32,
        angle: f32,
        penumbra: f32,
    ) -> Self {
        let [r, g, b, _] = rgb_hex(color, 1.0);
        let direction = (target - position).try_normalize().unwrap_or(Vec3::NEG_Y);
        Self {
            position,
            direction,
            color: [r, g, b],
            intensity,
            distance,
            cos_outer: angle.cos(),
            cos_inner: (angle * (1.0 - penumbra.clamp(0.0, 1.0))).cos(),
        }
    }

    fn from_config(c: &SpotLightConfig) -> Self {
        Self::new(
            c.position,
            c.target,
            c.color,
            c.intensity,
            c.distance,
            c.angle,
            c.penumbra,
        )
    }
}

/// Everything the backend needs to light a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLighting {
    pub ambient: [f32; 3],
    pub spots: Vec<SpotLight>,
}

impl SceneLighting {
    /// World light from config plus the rig's torch.
    pub fn from_scene(scene: &Scene) -> Self {
        let config: &LightingConfig = &scene.config().lighting;
        let [r, g, b, _] = rgb_hex(config.ambient_color, 1.0);
        let ambient = [
            r * config.ambient_intensity,
            g * config.ambient_intensity,
            b * config.ambient_intensity,
        ];

        let rig = scene.rig();
        let torch = rig.torch();
        let (torch_pos, torch_target) = rig.torch_world();

        Self {
            ambient,
            spots: vec![
                SpotLight::from_config(&config.spot),
                SpotLight::new(
                    torch_pos,
                    torch_target,
                    torch.color,
                    torch.intensity,
                    torch.distance,
                    torch.angle,
                    torch.penumbra,
                ),
            ],
        }
    }
}
