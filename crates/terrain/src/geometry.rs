use glam::Vec3;
use std::f32::consts::TAU;

/// Indexed open-cylinder mesh with its axis along local +Z.
#[derive(Debug, Clone)]
pub struct CylinderMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Build an open-ended cylinder lying along local Z.
///
/// Rings run from `z = -height/2` to `z = +height/2`; each ring holds
/// `radial_segments` vertices on the circle `x = r sin θ, y = r cos θ`.
/// The seam column is shared rather than duplicated, so the wrap-around
/// quads index back into column 0 and displaced vertices cannot split the
/// surface open. The mesh therefore has `radial_segments * (height_segments + 1)`
/// vertices, one column fewer than a UV-mapped cylinder; keep it that way.
pub fn cylinder_mesh(
    radius: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
) -> CylinderMesh {
    let rings = height_segments + 1;
    let mut positions = Vec::with_capacity((rings * radial_segments) as usize);

    for ring in 0..rings {
        let v = ring as f32 / height_segments as f32;
        let z = v * height - height / 2.0;
        for col in 0..radial_segments {
            let theta = col as f32 / radial_segments as f32 * TAU;
            positions.push(Vec3::new(radius * theta.sin(), radius * theta.cos(), z));
        }
    }

    let index = |ring: u32, col: u32| ring * radial_segments + col % radial_segments;
    let mut indices = Vec::with_capacity((height_segments * radial_segments * 6) as usize);
    for ring in 0..height_segments {
        for col in 0..radial_segments {
            let a = index(ring, col);
            let b = index(ring + 1, col);
            let c = index(ring + 1, col + 1);
            let d = index(ring, col + 1);
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    CylinderMesh { positions, indices }
}
