//! Drum terrain: an open cylinder whose vertices orbit their rest positions.
//!
//! # Invariants
//! - Vertex count is fixed at construction; wave state is indexed like positions.
//! - Animation only perturbs local x/y; `current.z == original.z` always.
//! - Vertices are independent of each other; a tick is O(N) with no coupling.

mod geometry;
mod surface;

pub use geometry::{CylinderMesh, cylinder_mesh};
pub use surface::{Surface, TerrainError, WaveState};

pub fn crate_info() -> &'static str {
    "tumbler-terrain v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("terrain"));
    }
}
