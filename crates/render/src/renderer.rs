use glam::{Mat4, Vec3};
use std::fmt::Write;
use tumbler_rig::Visual;
use tumbler_scene::Scene;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, -4.0),
            target: Vec3::Y,
            fov_degrees: 75.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

impl RenderView {
    /// The rig's third-person camera.
    pub fn from_scene(scene: &Scene) -> Self {
        let rig = scene.rig();
        let camera = &scene.config().camera;
        Self {
            eye: rig.camera_eye(),
            target: rig.camera_target(),
            fov_degrees: camera.fov_degrees,
            near: camera.near,
            far: camera.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads scene state and a view, then produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Human-readable frame dump for the CLI, logs and tests.
#[derive(Debug)]
pub struct DebugTextRenderer {
    /// How many surface vertices to list; the rest are summarised.
    pub sample_vertices: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self { sample_vertices: 4 }
    }

    pub fn with_samples(sample_vertices: usize) -> Self {
        Self { sample_vertices }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let surface = scene.surface();
        let rig = scene.rig();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "=== Scene (frame={}, elapsed={:.3}s) ===",
            scene.frame(),
            scene.elapsed()
        );
        let _ = writeln!(
            out,
            "Surface: vertices={} triangles={} rotation={:.5} rad",
            surface.vertex_count(),
            surface.indices().len() / 3,
            surface.rotation()
        );
        for (i, (p, w)) in surface
            .positions()
            .iter()
            .zip(surface.waves())
            .take(self.sample_vertices)
            .enumerate()
        {
            let _ = writeln!(
                out,
                "  v{i}: pos=({:.3}, {:.3}, {:.3}) angle={:.5} amp={:.5} speed={:.5}",
                p.x, p.y, p.z, w.angle, w.amplitude, w.angular_speed
            );
        }
        if surface.vertex_count() > self.sample_vertices {
            let _ = writeln!(
                out,
                "  ... {} more",
                surface.vertex_count() - self.sample_vertices
            );
        }

        let p = rig.transform().position;
        let visual = match rig.visual() {
            Visual::Model(bundle) => format!(
                "model '{}' ({} clips)",
                bundle.name,
                bundle.clip_count()
            ),
            other => other.label().to_string(),
        };
        let _ = writeln!(
            out,
            "Rig: pos=({:.2}, {:.2}, {:.2}) visual={}",
            p.x, p.y, p.z, visual
        );
        if let Some(action) = rig.mixer().and_then(|m| m.active()) {
            let _ = writeln!(
                out,
                "  clip #{} {} t={:.3}/{:.3} loops={}",
                action.clip_index,
                action.name.as_deref().unwrap_or("<unnamed>"),
                action.time,
                action.duration,
                action.loops
            );
        }
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tumbler_common::{SceneConfig, SurfaceConfig};

    fn scene() -> Scene {
        let config = SceneConfig {
            surface: SurfaceConfig {
                radial_segments: 6,
                height_segments: 2,
                ..SurfaceConfig::default()
            },
            ..SceneConfig::default()
        };
        Scene::new(config, 9).unwrap()
    }

    #[test]
    fn debug_renderer_fresh_scene() {
        let scene = scene();
        let view = RenderView::from_scene(&scene);
        let output = DebugTextRenderer::new().render(&scene, &view);

        assert!(output.contains("frame=0"));
        assert!(output.contains("vertices=18"));
        assert!(output.contains("triangles=24"));
        assert!(output.contains("visual=absent"));
        assert!(output.contains("... 14 more"));
        assert!(output.contains("fov=75"));
    }

    #[test]
    fn debug_renderer_after_ticks() {
        let mut scene = scene();
        scene.tick(1.0);
        let view = RenderView::from_scene(&scene);
        let output = DebugTextRenderer::with_samples(100).render(&scene, &view);

        assert!(output.contains("frame=1"));
        assert!(output.contains("v17:"));
        assert!(!output.contains("more"));
    }

    #[test]
    fn view_follows_rig_camera() {
        let scene = scene();
        let view = RenderView::from_scene(&scene);
        assert_eq!(view.eye, scene.rig().camera_eye());
        assert_eq!(view.target, scene.rig().camera_target());
        let vp = view.view_projection(16.0 / 9.0);
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 75.0);
        assert_eq!(view.far, 5000.0);
    }
}
