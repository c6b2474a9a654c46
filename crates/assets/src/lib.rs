//! Model bundles: a bind-pose mesh plus the list of animation clips.
//!
//! Bundles are identified by a content hash of the source file. Consumers only
//! depend on the clip count, clip lookup by index, and whether a fetch
//! succeeded; they never touch the glTF document directly.
//!
//! # Invariants
//! - A bundle is immutable once fetched.
//! - Clip order matches the order of animations in the source file.

mod gltf_import;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub use gltf_import::load_gltf;

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Hash raw file bytes into an id.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(id))
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("model has no triangle geometry: {0}")]
    NoGeometry(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Triangle mesh in bind pose, flattened into one index space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Scale uniformly so the mesh is `height` tall, centred on X/Z and
    /// standing on y = 0.
    pub fn fit_to_height(&mut self, height: f32) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let extent = hi.y - lo.y;
        if extent <= f32::EPSILON {
            return;
        }
        let scale = height / extent;
        let anchor = Vec3::new((lo.x + hi.x) * 0.5, lo.y, (lo.z + hi.z) * 0.5);
        for p in &mut self.positions {
            *p = (*p - anchor) * scale;
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One animation clip in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub name: Option<String>,
    /// Length in seconds: the latest keyframe time across the clip's channels.
    pub duration: f32,
}

/// A fetched character model.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub id: AssetId,
    pub name: String,
    pub mesh: MeshData,
    pub clips: Vec<ClipInfo>,
}

impl ModelBundle {
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn clip(&self, index: usize) -> Option<&ClipInfo> {
        self.clips.get(index)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id,
            name: self.name.clone(),
            vertex_count: self.mesh.positions.len(),
            triangle_count: self.mesh.triangle_count(),
            clips: self.clips.clone(),
        }
    }
}

/// Serializable description of a bundle for tooling output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: AssetId,
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub clips: Vec<ClipInfo>,
}

impl ModelSummary {
    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Something that can produce a model bundle, possibly slowly.
///
/// Fetches run off the frame thread, so implementations must be `Send`.
pub trait ModelSource: Send + 'static {
    fn fetch(&self) -> Result<ModelBundle, AssetError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// A glTF or GLB file on disk.
#[derive(Debug, Clone)]
pub struct GltfFile {
    path: PathBuf,
}

impl GltfFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for GltfFile {
    fn fetch(&self) -> Result<ModelBundle, AssetError> {
        load_gltf(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn crate_info() -> &'static str {
    "tumbler-assets v0.1.0"
}
