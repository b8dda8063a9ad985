pub mod appearance;
pub mod geometry;

pub use appearance::{rgb_from_hex, Appearance};
pub use geometry::{Aabb, MeshGeometry};

use glam::{EulerRot, Mat4, Vec3};
use std::sync::Arc;

/// Edge length of the interactive cube.
pub const TARGET_SIZE: f32 = 5.0;
/// Where the interactive cube sits in the world.
pub const TARGET_POSITION: Vec3 = Vec3::new(0.0, 5.0, -10.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// A mesh node in the scene graph.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub geometry: Arc<MeshGeometry>,
    /// Transform relative to the owning model (or the world, for the target).
    pub local_transform: Mat4,
    pub appearance: Appearance,
    /// Marks the one object that accepts dropped media.
    pub interactive: bool,
}

/// A mesh as it comes out of the asset loader, before it gets an id.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub name: String,
    pub geometry: Arc<MeshGeometry>,
    pub local_transform: Mat4,
    pub appearance: Appearance,
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub meshes: Vec<ModelMesh>,
}

/// The loaded asset: its meshes under a single editable transform.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub position: Vec3,
    /// Euler rotation offsets in radians, applied in X, Y, Z order.
    pub rotation: Vec3,
    objects: Vec<SceneObject>,
    bounds: Aabb,
}

impl Model {
    /// Bounds of the meshes in model space (before position and rotation).
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            )
    }

    /// Shift the model so its bounds are centred on the origin.
    pub fn center_on_origin(&mut self) {
        let rotation_only = Mat4::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        self.position = -self.bounds.transformed(&rotation_only).center();
    }

    /// World-space bounds with the current transform applied.
    pub fn world_bounds(&self) -> Aabb {
        self.bounds.transformed(&self.matrix())
    }
}

/// Everything the viewer draws and picks against.
pub struct SceneGraph {
    model: Option<Model>,
    target: SceneObject,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        let target = SceneObject {
            id: ObjectId(0),
            name: "Interactive Cube".to_string(),
            geometry: Arc::new(MeshGeometry::cuboid(Vec3::splat(TARGET_SIZE))),
            local_transform: Mat4::from_translation(TARGET_POSITION),
            appearance: Appearance::default_standard(),
            interactive: true,
        };
        Self {
            model: None,
            target,
            next_id: 1,
        }
    }

    /// Install a freshly loaded model, replacing any previous one.
    pub fn set_model(&mut self, loaded: LoadedModel) -> &mut Model {
        let mut bounds = Aabb::EMPTY;
        let mut objects = Vec::with_capacity(loaded.meshes.len());
        for mesh in loaded.meshes {
            bounds = bounds.union(&mesh.geometry.bounds.transformed(&mesh.local_transform));
            objects.push(SceneObject {
                id: ObjectId(self.next_id),
                name: mesh.name,
                geometry: mesh.geometry,
                local_transform: mesh.local_transform,
                appearance: mesh.appearance,
                interactive: false,
            });
            self.next_id += 1;
        }
        self.model.insert(Model {
            name: loaded.name,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            objects,
            bounds,
        })
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    pub fn target(&self) -> &SceneObject {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut SceneObject {
        &mut self.target
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        if self.target.id == id {
            return Some(&mut self.target);
        }
        self.model
            .as_mut()?
            .objects
            .iter_mut()
            .find(|object| object.id == id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        if self.target.id == id {
            return Some(&self.target);
        }
        self.model
            .as_ref()?
            .objects
            .iter()
            .find(|object| object.id == id)
    }

    /// Model meshes paired with their world matrices.
    pub fn model_objects(&self) -> Vec<(&SceneObject, Mat4)> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let matrix = model.matrix();
        model
            .objects
            .iter()
            .map(|object| (object, matrix * object.local_transform))
            .collect()
    }

    /// Every drawable object paired with its world matrix.
    pub fn objects(&self) -> Vec<(&SceneObject, Mat4)> {
        let mut objects = self.model_objects();
        objects.push((&self.target, self.target.local_transform));
        objects
    }

    /// Replace every model mesh's appearance with a fresh default.
    pub fn reset_model_appearance(&mut self) {
        if let Some(model) = &mut self.model {
            for object in &mut model.objects {
                object.appearance = Appearance::default_standard();
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit quads facing +Z, one at z = 0 and one at z = -2.
    pub(crate) fn two_panel_model() -> LoadedModel {
        let quad = Arc::new(MeshGeometry::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            None,
            Some(vec![0, 1, 2, 0, 2, 3]),
        ));
        LoadedModel {
            name: "panels.glb".to_string(),
            meshes: vec![
                ModelMesh {
                    name: "front".to_string(),
                    geometry: quad.clone(),
                    local_transform: Mat4::IDENTITY,
                    appearance: Appearance::Standard {
                        color: [0.8, 0.8, 0.8],
                        metalness: 0.0,
                        roughness: 1.0,
                    },
                },
                ModelMesh {
                    name: "back".to_string(),
                    geometry: quad,
                    local_transform: Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)),
                    appearance: Appearance::Standard {
                        color: [0.8, 0.8, 0.8],
                        metalness: 0.0,
                        roughness: 1.0,
                    },
                },
            ],
        }
    }

    #[test]
    fn target_exists_before_any_model() {
        let scene = SceneGraph::new();
        assert!(scene.model().is_none());
        assert!(scene.target().interactive);
        assert_eq!(scene.objects().len(), 1);
        assert!(scene.model_objects().is_empty());
    }

    #[test]
    fn model_objects_get_unique_ids() {
        let mut scene = SceneGraph::new();
        scene.set_model(two_panel_model());
        let ids: Vec<ObjectId> = scene.objects().iter().map(|(object, _)| object.id).collect();
        assert_eq!(ids, vec![ObjectId(1), ObjectId(2), ObjectId(0)]);
        assert!(scene.object(ObjectId(2)).is_some());
        assert!(scene.object(ObjectId(9)).is_none());
    }

    #[test]
    fn centering_moves_bounds_to_origin() {
        let mut scene = SceneGraph::new();
        let model = scene.set_model(two_panel_model());
        assert_eq!(model.bounds().center(), Vec3::new(0.0, 0.0, -1.0));
        model.center_on_origin();
        assert_eq!(model.position, Vec3::new(0.0, 0.0, 1.0));
        assert!(model.world_bounds().center().length() < 1e-5);
    }

    #[test]
    fn reset_only_touches_model_meshes() {
        let mut scene = SceneGraph::new();
        scene.set_model(two_panel_model());
        scene.target_mut().appearance = Appearance::hologram([0.0, 1.0, 0.0]);
        scene.reset_model_appearance();
        for (object, _) in scene.model_objects() {
            assert_eq!(object.appearance, Appearance::default_standard());
        }
        assert!(matches!(scene.target().appearance, Appearance::Hologram { .. }));
    }
}
