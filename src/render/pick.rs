//! CPU ray picking
//!
//! Rays are cast in world space and tested against each object in its own
//! local space (the inverse world matrix maps the ray over). Because the
//! direction is not renormalised after the mapping, the ray parameter `t`
//! stays comparable between objects, so the nearest hit is simply the
//! smallest `t`.

use crate::scene::{Aabb, MeshGeometry, ObjectId, SceneObject};
use glam::{Mat4, Vec3};

const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub object: ObjectId,
    pub distance: f32,
    pub point: Vec3,
    pub triangle: usize,
}

/// Nearest intersection of `ray` with any of `objects`.
///
/// With `cull_backfaces` only triangles wound counter-clockwise towards the
/// ray origin count as hits.
pub fn raycast<'a>(
    ray: &Ray,
    objects: impl IntoIterator<Item = (&'a SceneObject, Mat4)>,
    cull_backfaces: bool,
) -> Option<PickHit> {
    let mut nearest: Option<PickHit> = None;
    for (object, world) in objects {
        let determinant = world.determinant();
        if determinant.abs() < EPSILON {
            continue;
        }
        let local_ray = ray.transformed(&world.inverse());
        let limit = nearest.map(|hit| hit.distance).unwrap_or(f32::INFINITY);
        let Some((t, triangle)) =
            intersect_geometry(&local_ray, &object.geometry, cull_backfaces, limit)
        else {
            continue;
        };
        nearest = Some(PickHit {
            object: object.id,
            distance: t,
            point: ray.at(t),
            triangle,
        });
    }
    nearest
}

fn intersect_geometry(
    ray: &Ray,
    geometry: &MeshGeometry,
    cull_backfaces: bool,
    limit: f32,
) -> Option<(f32, usize)> {
    let entry = intersect_aabb(ray, &geometry.bounds)?;
    if entry > limit {
        return None;
    }
    let mut best: Option<(f32, usize)> = None;
    for index in 0..geometry.triangle_count() {
        let Some([a, b, c]) = geometry.triangle(index) else {
            break;
        };
        let (Some(a), Some(b), Some(c)) = (
            geometry.positions.get(a as usize),
            geometry.positions.get(b as usize),
            geometry.positions.get(c as usize),
        ) else {
            continue;
        };
        let Some(t) = intersect_triangle(ray, *a, *b, *c, cull_backfaces) else {
            continue;
        };
        let current = best.map(|(t, _)| t).unwrap_or(limit);
        if t < current {
            best = Some((t, index));
        }
    }
    best
}

/// Möller–Trumbore ray/triangle test. Returns the ray parameter of the hit.
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3, cull_backfaces: bool) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if cull_backfaces {
        if det < EPSILON {
            return None;
        }
    } else if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Slab test. Returns the entry parameter (0 when the origin is inside).
pub fn intersect_aabb(ray: &Ray, bounds: &Aabb) -> Option<f32> {
    if bounds.is_empty() {
        return None;
    }
    let mut t_min = 0.0f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);
        if direction.abs() < EPSILON {
            if origin < min || origin > max {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let mut t0 = (min - origin) * inv;
        let mut t1 = (max - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

// ========================================================================
// Tests
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{tests::two_panel_model, SceneGraph};

    #[test]
    fn triangle_hit_and_backface() {
        let (a, b, c) = (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let toward = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((intersect_triangle(&toward, a, b, c, true).unwrap() - 5.0).abs() < 1e-5);

        let behind = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(intersect_triangle(&behind, a, b, c, true).is_none());
        assert!(intersect_triangle(&behind, a, b, c, false).is_some());
    }

    #[test]
    fn triangle_miss_outside_edges() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = intersect_triangle(
            &ray,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            false,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn aabb_entry_and_inside() {
        let bounds = Aabb::from_points(&[Vec3::splat(-1.0), Vec3::splat(1.0)]);
        let outside = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((intersect_aabb(&outside, &bounds).unwrap() - 4.0).abs() < 1e-5);

        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(intersect_aabb(&inside, &bounds), Some(0.0));

        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(intersect_aabb(&away, &bounds).is_none());
    }

    #[test]
    fn raycast_returns_nearest_object() {
        let mut scene = SceneGraph::new();
        scene.set_model(two_panel_model());
        let ray = Ray::new(Vec3::new(0.2, 0.1, 10.0), Vec3::NEG_Z);
        let hit = raycast(&ray, scene.model_objects(), true).unwrap();
        assert_eq!(hit.object, ObjectId(1));
        assert!((hit.distance - 10.0).abs() < 1e-4);
        assert!((hit.point.z).abs() < 1e-4);
    }

    #[test]
    fn raycast_respects_model_transform() {
        let mut scene = SceneGraph::new();
        let model = scene.set_model(two_panel_model());
        model.position = Vec3::new(100.0, 0.0, 0.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(raycast(&ray, scene.model_objects(), true).is_none());

        let shifted = Ray::new(Vec3::new(100.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(raycast(&shifted, scene.model_objects(), true).is_some());
    }

    #[test]
    fn raycast_hits_target_cube() {
        let scene = SceneGraph::new();
        let ray = Ray::new(Vec3::new(0.0, 5.0, 20.0), Vec3::NEG_Z);
        let target = scene.target();
        let hit = raycast(&ray, [(target, target.local_transform)], true).unwrap();
        assert_eq!(hit.object, target.id);
        assert!((hit.point.z + 7.5).abs() < 1e-4);
    }
}
