use glam::{Mat4, Vec2, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bounds = Self::EMPTY;
        for point in points {
            bounds.extend(*point);
        }
        bounds
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere through the box corners.
    pub fn bounding_radius(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max - self.min).length() * 0.5
    }

    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.extend(matrix.transform_point3(corner));
        }
        out
    }
}

/// Triangle-list geometry shared between scene objects.
///
/// UVs use a top-left origin, matching egui texture coordinates.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl MeshGeometry {
    pub fn new(positions: Vec<Vec3>, uvs: Option<Vec<Vec2>>, indices: Option<Vec<u32>>) -> Self {
        let uvs = match uvs {
            Some(uvs) if uvs.len() == positions.len() => uvs,
            _ => vec![Vec2::ZERO; positions.len()],
        };
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            uvs,
            indices,
            bounds,
        }
    }

    /// Axis-aligned box centred on the origin, one full texture per face.
    pub fn cuboid(size: Vec3) -> Self {
        let half = size * 0.5;
        // (normal, u axis, v axis) with u x v == normal so faces wind CCW from outside.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let center = normal * half;
            let u = u * half;
            let v = v * half;
            let base = positions.len() as u32;
            positions.extend([center - u - v, center + u - v, center + u + v, center - u + v]);
            uvs.extend([
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(positions, Some(uvs), Some(indices))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, index: usize) -> Option<[u32; 3]> {
        let start = index * 3;
        let tri = self.indices.get(start..start + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb, MeshGeometry};
    use glam::{Mat4, Vec3};

    #[test]
    fn cuboid_faces_point_outward() {
        let geometry = MeshGeometry::cuboid(Vec3::splat(5.0));
        assert_eq!(geometry.triangle_count(), 12);
        for index in 0..geometry.triangle_count() {
            let [a, b, c] = geometry.triangle(index).unwrap();
            let (a, b, c) = (
                geometry.positions[a as usize],
                geometry.positions[b as usize],
                geometry.positions[c as usize],
            );
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {index} faces inward");
        }
        assert_eq!(geometry.bounds.min, Vec3::splat(-2.5));
        assert_eq!(geometry.bounds.max, Vec3::splat(2.5));
    }

    #[test]
    fn empty_bounds_have_zero_radius() {
        let bounds = Aabb::EMPTY;
        assert!(bounds.is_empty());
        assert_eq!(bounds.bounding_radius(), 0.0);
        assert_eq!(bounds.center(), Vec3::ZERO);
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let bounds = Aabb::from_points(&[Vec3::splat(-1.0), Vec3::splat(1.0)]);
        let moved = bounds.transformed(&Mat4::from_translation(Vec3::new(0.0, 5.0, -10.0)));
        assert_eq!(moved.center(), Vec3::new(0.0, 5.0, -10.0));
        assert!((moved.bounding_radius() - 3.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn missing_indices_become_a_triangle_list() {
        let geometry = MeshGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], None, None);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(geometry.uvs.len(), 3);
    }
}
