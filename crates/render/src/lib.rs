//! Rendering adapter: renderer-agnostic view and lighting derived from a scene.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - The view always comes from the rig's camera placement.

mod lighting;
mod renderer;

pub use lighting::{SceneLighting, SpotLight};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "tumbler-render v0.1.0"
}
