use glam::{Mat4, Vec3};
use std::path::Path;

use crate::{AssetError, AssetId, ClipInfo, MeshData, ModelBundle};

/// Read a .gltf or .glb file into a bundle.
///
/// All triangle primitives reachable from the default scene are flattened
/// into one mesh with node transforms applied. External buffers are resolved
/// relative to the file; images are not decoded.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<ModelBundle, AssetError> {
    let path = path.as_ref();
    let _span = tracing::info_span!("load_gltf", path = %path.display()).entered();

    let bytes = std::fs::read(path)?;
    let id = AssetId::from_bytes(&bytes);
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(&bytes)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;

    let mesh = collect_mesh(&document, &buffers);
    if mesh.indices.is_empty() {
        return Err(AssetError::NoGeometry(path.display().to_string()));
    }
    let clips = collect_clips(&document, &buffers);

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".into());

    tracing::info!(
        vertices = mesh.positions.len(),
        triangles = mesh.triangle_count(),
        clips = clips.len(),
        "loaded model {name}"
    );

    Ok(ModelBundle {
        id,
        name,
        mesh,
        clips,
    })
}

fn collect_mesh(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> MeshData {
    let mut mesh = MeshData::default();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Mat4::IDENTITY, buffers, &mut mesh);
            }
        }
        None => {
            for m in document.meshes() {
                append_mesh(&m, Mat4::IDENTITY, buffers, &mut mesh);
            }
        }
    }
    mesh
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut MeshData,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        append_mesh(&mesh, world, buffers, out);
    }
    for child in node.children() {
        visit_node(&child, world, buffers, out);
    }
}

fn append_mesh(
    mesh: &gltf::Mesh,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut MeshData,
) {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base = out.positions.len() as u32;
        out.positions.extend(
            positions.map(|p| world.transform_point3(Vec3::from_array(p))),
        );
        let count = out.positions.len() as u32 - base;

        match reader.read_indices() {
            Some(indices) => out.indices.extend(indices.into_u32().map(|i| base + i)),
            None => out.indices.extend(base..base + count),
        }
    }
}

fn collect_clips(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<ClipInfo> {
    document
        .animations()
        .map(|animation| {
            let duration = animation
                .channels()
                .filter_map(|channel| {
                    let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                    reader
                        .read_inputs()
                        .map(|times| times.fold(0.0_f32, f32::max))
                })
                .fold(0.0_f32, f32::max);
            ClipInfo {
                name: animation.name().map(str::to_owned),
                duration,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Write a one-triangle glTF with `clip_count` animations next to its
    /// binary buffer. Each clip moves the node over `[0, 1.5]` seconds.
    fn write_fixture(dir: &Path, clip_count: usize) -> std::path::PathBuf {
        let mut bin = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for t in [0.0f32, 1.5] {
            bin.extend_from_slice(&t.to_le_bytes());
        }
        for v in [[0.0f32, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        std::fs::write(dir.join("fixture.bin"), &bin).unwrap();

        let animations: Vec<_> = (0..clip_count)
            .map(|i| {
                json!({
                    "name": format!("clip{i}"),
                    "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }],
                    "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }]
                })
            })
            .collect();

        let doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0, "translation": [0.0, 10.0, 0.0] }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
            "buffers": [{ "uri": "fixture.bin", "byteLength": bin.len() }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 44, "byteLength": 24 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 0.0] },
                { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
                  "min": [0.0], "max": [1.5] },
                { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
            ],
            "animations": animations
        });

        let path = dir.join("fixture.gltf");
        std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
        path
    }

    #[test]
    fn loads_mesh_with_node_transform() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 0);
        let bundle = load_gltf(&path).unwrap();

        assert_eq!(bundle.name, "fixture");
        assert_eq!(bundle.mesh.positions.len(), 3);
        // non-indexed primitive gets sequential indices
        assert_eq!(bundle.mesh.indices, vec![0, 1, 2]);
        // node translation is applied
        assert!((bundle.mesh.positions[2] - Vec3::new(0.0, 12.0, 0.0)).length() < 1e-6);
        assert_eq!(bundle.clip_count(), 0);
    }

    #[test]
    fn reads_clip_names_and_durations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 8);
        let bundle = load_gltf(&path).unwrap();

        assert_eq!(bundle.clip_count(), 8);
        let clip = bundle.clip(6).unwrap();
        assert_eq!(clip.name.as_deref(), Some("clip6"));
        assert!((clip.duration - 1.5).abs() < 1e-6);
    }

    #[test]
    fn same_file_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 1);
        let a = load_gltf(&path).unwrap();
        let b = load_gltf(&path).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_gltf("/nonexistent/Xbot.glb").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn garbage_is_gltf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.glb");
        std::fs::write(&path, b"definitely not a model").unwrap();
        let err = load_gltf(&path).unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn document_without_geometry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gltf");
        std::fs::write(&path, br#"{"asset":{"version":"2.0"}}"#).unwrap();
        let err = load_gltf(&path).unwrap_err();
        assert!(matches!(err, AssetError::NoGeometry(_)));
    }
}
