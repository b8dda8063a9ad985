use crate::scene::{Appearance, LoadedModel, MeshGeometry, ModelMesh};
use glam::{Mat4, Vec2, Vec3};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import glTF {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF {path} has no scene")]
    NoScene { path: String },
    #[error("glTF {path} contains no triangle meshes")]
    NoMeshes { path: String },
    #[error("failed to start asset loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("asset loader thread exited without a result")]
    LoaderGone,
}

/// Import a glTF/GLB file into CPU-side mesh geometry.
///
/// Node transforms are flattened into each mesh's local transform. Only
/// triangle-list primitives are kept; each primitive takes its material's
/// base color factor as its initial appearance.
pub fn load_model(path: &Path) -> Result<LoadedModel, AssetError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.display().to_string(),
        source,
    })?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::NoScene {
            path: path.display().to_string(),
        })?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
    }
    if meshes.is_empty() {
        return Err(AssetError::NoMeshes {
            path: path.display().to_string(),
        });
    }

    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("gltf")
        .to_string();
    Ok(LoadedModel { name, meshes })
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ModelMesh>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .or_else(|| node.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!(
                    "Skipping {:?} primitive {} of {}",
                    primitive.mode(),
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
            let uvs = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().map(Vec2::from_array).collect());
            let indices = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect());

            let pbr = primitive.material().pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let name = if mesh.primitives().len() > 1 {
                format!("{}#{}", mesh_name, primitive.index())
            } else {
                mesh_name.clone()
            };
            out.push(ModelMesh {
                name,
                geometry: Arc::new(MeshGeometry::new(positions, uvs, indices)),
                local_transform: world,
                appearance: Appearance::Standard {
                    color: [r, g, b],
                    metalness: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                },
            });
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

/// Imports one model on a background thread.
pub struct AssetLoader {
    path: PathBuf,
    receiver: Option<Receiver<Result<LoadedModel, AssetError>>>,
}

impl AssetLoader {
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel();
        let job_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name("asset-load".to_string())
            .spawn(move || {
                let _ = sender.send(load_model(&job_path));
            });
        let receiver = match spawned {
            Ok(_) => Some(receiver),
            Err(err) => {
                log::warn!("{}", AssetError::Spawn(err));
                None
            }
        };
        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    /// The import result, once, when it is ready.
    pub fn poll(&mut self) -> Option<Result<LoadedModel, AssetError>> {
        let receiver = self.receiver.as_ref()?;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AssetError::LoaderGone),
        };
        self.receiver = None;
        Some(result)
    }

    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<Result<LoadedModel, AssetError>> {
        let result = self.receiver.as_ref()?.recv_timeout(timeout).ok()?;
        self.receiver = None;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write_triangle_gltf(name: &str) -> PathBuf {
        let dir = std::env::temp_dir();
        let stem = format!("holoscene_{}_{}", name, std::process::id());
        let bin_name = format!("{stem}.bin");

        let mut bytes = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        std::fs::write(dir.join(&bin_name), &bytes).unwrap();

        let document = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "translation": [0.0, 0.0, -3.0], "children": [1] },
                { "mesh": 0, "translation": [1.0, 0.0, 0.0] }
            ],
            "meshes": [{
                "name": "triangle",
                "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
            }],
            "materials": [{
                "pbrMetallicRoughness": {
                    "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                    "metallicFactor": 0.25,
                    "roughnessFactor": 0.5
                }
            }],
            "buffers": [{ "uri": bin_name, "byteLength": bytes.len() }],
            "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": bytes.len() }],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            }]
        });
        let path = dir.join(format!("{stem}.gltf"));
        std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
        path
    }

    #[test]
    fn loads_triangle_with_flattened_transform() {
        let path = write_triangle_gltf("load");
        let model = load_model(&path).unwrap();
        assert_eq!(model.meshes.len(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "triangle");
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        let origin = mesh.local_transform.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 0.0, -3.0)).length() < 1e-6);
        assert_eq!(
            mesh.appearance,
            Appearance::Standard {
                color: [1.0, 0.0, 0.0],
                metalness: 0.25,
                roughness: 0.5,
            }
        );
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let result = load_model(Path::new("/nonexistent/holoscene/level.glb"));
        assert!(matches!(result, Err(AssetError::Import { .. })));
    }

    #[test]
    fn loader_reports_once() {
        let path = write_triangle_gltf("loader");
        let mut loader = AssetLoader::spawn(path);
        assert!(loader.is_pending());
        let result = loader.wait(Duration::from_secs(10)).unwrap();
        assert!(result.is_ok());
        assert!(!loader.is_pending());
        assert!(loader.poll().is_none());
    }
}
