//! Software scene painter
//!
//! Every triangle is projected on the CPU, clipped against the near plane,
//! back-face culled, flat shaded and sorted back to front. The result is a
//! list of egui meshes in screen points, batched by texture, that the egui
//! pass draws underneath the control panel.

use crate::config::LightIntensities;
use crate::media::TextureId;
use crate::render::camera::CameraController;
use crate::scene::{rgb_from_hex, Appearance, SceneGraph, SceneObject};
use egui::epaint::{Vertex, WHITE_UV};
use egui::{Color32, Mesh, Pos2};
use glam::{Mat4, Vec2, Vec3, Vec4};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x88, 0x85, 0x90);

const SKY_COLOR: u32 = 0xffffff;
const GROUND_COLOR: u32 = 0x222222;
const KEY_LIGHT_POSITION: Vec3 = Vec3::new(5.0, 10.0, 5.0);
const BACK_LIGHT_POSITION: Vec3 = Vec3::new(-5.0, -10.0, -5.0);

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    uv: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct PaintTriangle {
    depth: f32,
    texture: egui::TextureId,
    vertices: [Vertex; 3],
}

/// Output of one paint pass.
#[derive(Default)]
pub struct PaintedScene {
    pub meshes: Vec<Mesh>,
    pub triangles: usize,
}

pub struct ScenePainter<'a> {
    view_projection: Mat4,
    viewport_px: Vec2,
    pixels_per_point: f32,
    lights: LightIntensities,
    texture_lookup: &'a dyn Fn(TextureId) -> Option<egui::TextureId>,
}

impl<'a> ScenePainter<'a> {
    pub fn new(
        camera: &CameraController,
        viewport_px: Vec2,
        pixels_per_point: f32,
        lights: LightIntensities,
        texture_lookup: &'a dyn Fn(TextureId) -> Option<egui::TextureId>,
    ) -> Self {
        let aspect = if viewport_px.y > 0.0 {
            viewport_px.x / viewport_px.y
        } else {
            1.0
        };
        Self {
            view_projection: camera.view_projection(aspect),
            viewport_px,
            pixels_per_point: pixels_per_point.max(f32::EPSILON),
            lights,
            texture_lookup,
        }
    }

    pub fn paint(&self, scene: &SceneGraph) -> PaintedScene {
        if self.viewport_px.x <= 0.0 || self.viewport_px.y <= 0.0 {
            return PaintedScene::default();
        }
        let mut triangles = Vec::new();
        for (object, world) in scene.objects() {
            self.collect_object(object, world, &mut triangles);
        }
        triangles.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let count = triangles.len();
        let mut meshes: Vec<Mesh> = Vec::new();
        for triangle in triangles {
            let needs_new = meshes
                .last()
                .map_or(true, |mesh| mesh.texture_id != triangle.texture);
            if needs_new {
                meshes.push(Mesh::with_texture(triangle.texture));
            }
            if let Some(mesh) = meshes.last_mut() {
                let base = mesh.vertices.len() as u32;
                mesh.vertices.extend_from_slice(&triangle.vertices);
                mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
        PaintedScene {
            meshes,
            triangles: count,
        }
    }

    fn collect_object(&self, object: &SceneObject, world: Mat4, out: &mut Vec<PaintTriangle>) {
        let geometry = &object.geometry;
        let (texture, textured) = match object.appearance {
            Appearance::Textured { texture } => match (self.texture_lookup)(texture) {
                Some(id) => (id, true),
                None => (egui::TextureId::default(), false),
            },
            _ => (egui::TextureId::default(), false),
        };
        let mvp = self.view_projection * world;

        for index in 0..geometry.triangle_count() {
            let Some(corners) = geometry.triangle(index) else {
                break;
            };
            let mut world_positions = [Vec3::ZERO; 3];
            let mut polygon = Vec::with_capacity(4);
            let mut valid = true;
            for (slot, corner) in corners.iter().enumerate() {
                let Some(position) = geometry.positions.get(*corner as usize) else {
                    valid = false;
                    break;
                };
                world_positions[slot] = world.transform_point3(*position);
                let uv = geometry
                    .uvs
                    .get(*corner as usize)
                    .copied()
                    .unwrap_or(Vec2::ZERO);
                polygon.push(ClipVertex {
                    clip: mvp * position.extend(1.0),
                    uv,
                });
            }
            if !valid {
                continue;
            }

            let normal = (world_positions[1] - world_positions[0])
                .cross(world_positions[2] - world_positions[0])
                .normalize_or_zero();
            let color = self.face_color(&object.appearance, normal, textured);

            let clipped = clip_near(&polygon);
            if clipped.len() < 3 {
                continue;
            }
            for fan in 1..clipped.len() - 1 {
                let triangle = [clipped[0], clipped[fan], clipped[fan + 1]];
                if let Some(painted) = self.project(triangle, color, texture, textured) {
                    out.push(painted);
                }
            }
        }
    }

    fn project(
        &self,
        triangle: [ClipVertex; 3],
        color: Color32,
        texture: egui::TextureId,
        textured: bool,
    ) -> Option<PaintTriangle> {
        let ndc = triangle.map(|vertex| vertex.clip.truncate() / vertex.clip.w);
        if ndc.iter().all(|p| p.x < -1.0)
            || ndc.iter().all(|p| p.x > 1.0)
            || ndc.iter().all(|p| p.y < -1.0)
            || ndc.iter().all(|p| p.y > 1.0)
            || ndc.iter().all(|p| p.z > 1.0)
        {
            return None;
        }
        // Counter-clockwise in NDC is front facing.
        let area = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
            - (ndc[2].x - ndc[0].x) * (ndc[1].y - ndc[0].y);
        if area <= 0.0 {
            return None;
        }

        let mut vertices = [Vertex {
            pos: Pos2::ZERO,
            uv: WHITE_UV,
            color,
        }; 3];
        for (slot, (point, source)) in ndc.iter().zip(triangle.iter()).enumerate() {
            let x = (point.x * 0.5 + 0.5) * self.viewport_px.x;
            let y = (0.5 - point.y * 0.5) * self.viewport_px.y;
            vertices[slot].pos = Pos2::new(x / self.pixels_per_point, y / self.pixels_per_point);
            if textured {
                vertices[slot].uv = Pos2::new(source.uv.x, source.uv.y);
            }
        }
        let depth = triangle.iter().map(|vertex| vertex.clip.w).sum::<f32>() / 3.0;
        Some(PaintTriangle {
            depth,
            texture,
            vertices,
        })
    }

    fn face_color(&self, appearance: &Appearance, normal: Vec3, textured: bool) -> Color32 {
        match *appearance {
            Appearance::Standard { color, .. } => {
                let light = self.irradiance(normal);
                to_color32(Vec3::from_array(color) * light, 1.0)
            }
            Appearance::Hologram { color, opacity } => to_color32(Vec3::from_array(color), opacity),
            Appearance::Textured { .. } if textured => Color32::WHITE,
            // Texture not uploaded yet.
            Appearance::Textured { .. } => Color32::BLACK,
        }
    }

    fn irradiance(&self, normal: Vec3) -> Vec3 {
        let sky = Vec3::from_array(rgb_from_hex(SKY_COLOR));
        let ground = Vec3::from_array(rgb_from_hex(GROUND_COLOR));
        let hemisphere = ground.lerp(sky, 0.5 * normal.y + 0.5) * self.lights.hemisphere;
        let key = normal.dot(KEY_LIGHT_POSITION.normalize()).max(0.0) * self.lights.directional;
        let back = normal.dot(BACK_LIGHT_POSITION.normalize()).max(0.0) * self.lights.back;
        hemisphere + Vec3::splat(key + back)
    }
}

fn to_color32(rgb: Vec3, alpha: f32) -> Color32 {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(
        channel(rgb.x),
        channel(rgb.y),
        channel(rgb.z),
        channel(alpha),
    )
}

/// Sutherland–Hodgman against the near plane (clip-space z >= 0).
fn clip_near(polygon: &[ClipVertex]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (index, current) in polygon.iter().enumerate() {
        let next = polygon[(index + 1) % polygon.len()];
        let current_in = current.clip.z >= 0.0;
        let next_in = next.clip.z >= 0.0;
        if current_in {
            out.push(*current);
        }
        if current_in != next_in {
            let t = current.clip.z / (current.clip.z - next.clip.z);
            out.push(ClipVertex {
                clip: current.clip.lerp(next.clip, t),
                uv: current.uv.lerp(next.uv, t),
            });
        }
    }
    out
}
