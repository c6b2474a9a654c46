//! Scene driver: owns the drum and the rig and advances them once per frame.
//!
//! # Invariants
//! - Each frame ticks the surface first, then the rig, with the same `dt`.
//! - Nothing here touches the GPU; renderers read the scene after a tick.

mod scene;
mod timing;

pub use scene::{Scene, SceneError};
pub use timing::FrameTimer;

pub fn crate_info() -> &'static str {
    "tumbler-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
