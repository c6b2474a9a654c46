//! wgpu render backend for the tumbler scene.
//!
//! Draws the player rig opaque, then the drum surface translucent on top,
//! lit by an ambient term and the scene's spot lights.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Surface positions are re-uploaded every frame; indices never change.

mod camera;
mod gpu;
mod shaders;

pub use camera::FollowCamera;
pub use gpu::{SURFACE_COLOR, SURFACE_OPACITY, WgpuRenderer};
