use glam::{Mat4, Vec3};
use tumbler_common::CameraConfig;
use tumbler_render::RenderView;

/// Perspective camera that tracks the rig's third-person view.
///
/// Placement comes from the scene each frame; only the viewport aspect is
/// owned here.
#[derive(Debug, Clone, Copy)]
pub struct FollowCamera {
    pub view: RenderView,
    pub aspect: f32,
}

impl FollowCamera {
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            view: RenderView {
                fov_degrees: config.fov_degrees,
                near: config.near,
                far: config.far,
                ..RenderView::default()
            },
            aspect: 1.0,
        };
        camera.set_viewport(width, height);
        camera
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn follow(&mut self, view: RenderView) {
        self.view = view;
    }

    pub fn eye(&self) -> Vec3 {
        self.view.eye
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view.view_projection(self.aspect)
    }
}
