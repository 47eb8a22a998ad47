//! Triangle meshes and the primitive shapes used to furnish the room.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Interleaved `position.xyz, normal.xyz` vertices with a triangle index list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub const STRIDE: usize = 6;

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::STRIDE
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * Self::STRIDE..index * Self::STRIDE + 3])
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Smooth normals accumulated from the faces sharing each vertex.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertex_count()];
        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let p0 = self.position(i0);
            let face = (self.position(i1) - p0).cross(self.position(i2) - p0);
            if let Some(face) = face.try_normalize() {
                accum[i0] += face;
                accum[i1] += face;
                accum[i2] += face;
            }
        }
        for (vertex, normal) in self.vertices.chunks_exact_mut(Self::STRIDE).zip(accum) {
            vertex[3..6].copy_from_slice(&normal.normalize_or_zero().to_array());
        }
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        (0..self.vertex_count())
            .map(|i| self.position(i))
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((min, max)) => Some((min.min(p), max.max(p))),
            })
    }
}

const CORNERS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Box centred on the origin.
pub fn cuboid(size: Vec3) -> Mesh {
    let half = size * 0.5;
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let mut mesh = Mesh::default();
    for (normal, u, v) in faces {
        let corners = CORNERS.map(|c| {
            let position = (normal + u * c.x + v * c.y) * half;
            mesh.push_vertex(position, normal)
        });
        mesh.push_triangle(corners[0], corners[1], corners[2]);
        mesh.push_triangle(corners[0], corners[2], corners[3]);
    }
    mesh
}

/// Y-up cylinder centred on the origin. A zero radius closes that end to a point.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    capped: bool,
) -> Mesh {
    let segments = segments.max(3);
    let half = height * 0.5;
    let slope = if height > 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };
    let mut mesh = Mesh::default();
    for i in 0..=segments {
        let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
        let normal = Vec3::new(sin, slope, cos).normalize_or_zero();
        mesh.push_vertex(Vec3::new(radius_top * sin, half, radius_top * cos), normal);
        mesh.push_vertex(Vec3::new(radius_bottom * sin, -half, radius_bottom * cos), normal);
    }
    for i in 0..segments {
        let top = i * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        mesh.push_triangle(top, bottom, next_bottom);
        mesh.push_triangle(top, next_bottom, next_top);
    }
    if capped {
        let ends = [
            (radius_top, half, Vec3::Y),
            (radius_bottom, -half, Vec3::NEG_Y),
        ];
        for (radius, y, normal) in ends {
            if radius > 0.0 {
                push_fan(&mut mesh, radius, y, normal, segments);
            }
        }
    }
    mesh
}

fn push_fan(mesh: &mut Mesh, radius: f32, y: f32, normal: Vec3, segments: u32) {
    let centre = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);
    let ring: Vec<u32> = (0..=segments)
        .map(|i| {
            let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
            mesh.push_vertex(Vec3::new(radius * sin, y, radius * cos), normal)
        })
        .collect();
    for pair in ring.windows(2) {
        mesh.push_triangle(centre, pair[0], pair[1]);
    }
}

pub fn cone(radius: f32, height: f32, segments: u32, capped: bool) -> Mesh {
    cylinder(0.0, radius, height, segments, capped)
}

/// Flat disc in the XY plane facing +Z.
pub fn disc(radius: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let mut mesh = Mesh::default();
    let centre = mesh.push_vertex(Vec3::ZERO, Vec3::Z);
    for i in 0..=segments {
        let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
        mesh.push_vertex(Vec3::new(radius * cos, radius * sin, 0.0), Vec3::Z);
    }
    for i in 1..=segments {
        mesh.push_triangle(centre, i, i + 1);
    }
    mesh
}

/// Flat-shaded icosahedron.
pub fn icosahedron(radius: f32) -> Mesh {
    let t = (1.0 + 5.0_f32.sqrt()) * 0.5;
    let corners = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .map(|corner| corner.normalize() * radius);
    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    let mut mesh = Mesh::default();
    for [a, b, c] in FACES {
        let normal = (corners[b] - corners[a])
            .cross(corners[c] - corners[a])
            .normalize_or_zero();
        let ia = mesh.push_vertex(corners[a], normal);
        let ib = mesh.push_vertex(corners[b], normal);
        let ic = mesh.push_vertex(corners[c], normal);
        mesh.push_triangle(ia, ib, ic);
    }
    mesh
}

/// Rectangle in the XY plane facing +Z.
pub fn quad(width: f32, height: f32) -> Mesh {
    let half = Vec2::new(width, height) * 0.5;
    let mut mesh = Mesh::default();
    let corners = CORNERS.map(|c| mesh.push_vertex((c * half).extend(0.0), Vec3::Z));
    mesh.push_triangle(corners[0], corners[1], corners[2]);
    mesh.push_triangle(corners[0], corners[2], corners[3]);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_spans_its_size() {
        let mesh = cuboid(Vec3::new(0.8, 0.2, 0.8));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let (min, max) = mesh.bounds().unwrap();
        assert!((max - min - Vec3::new(0.8, 0.2, 0.8)).length() < 1e-6);
    }

    #[test]
    fn cone_tapers_to_a_point() {
        let mesh = cone(0.25, 0.3, 32, false);
        let (min, max) = mesh.bounds().unwrap();
        assert!((max.y - 0.15).abs() < 1e-6);
        assert!((min.y + 0.15).abs() < 1e-6);
        let apex_radius = (0..mesh.vertex_count())
            .map(|i| mesh.position(i))
            .filter(|p| (p.y - 0.15).abs() < 1e-6)
            .map(|p| Vec2::new(p.x, p.z).length())
            .fold(0.0_f32, f32::max);
        assert!(apex_radius < 1e-6);
    }

    #[test]
    fn icosahedron_vertices_sit_on_the_sphere() {
        let mesh = icosahedron(0.15);
        assert_eq!(mesh.indices.len(), 60);
        for i in 0..mesh.vertex_count() {
            assert!((mesh.position(i).length() - 0.15).abs() < 1e-5);
        }
    }

    #[test]
    fn quad_is_a_single_face() {
        let mesh = quad(1.0, 1.0);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.chunks_exact(6).all(|v| v[5] == 1.0));
    }

    #[test]
    fn computes_smooth_normals() {
        let mut mesh = Mesh::default();
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            mesh.push_vertex(p, Vec3::ZERO);
        }
        mesh.push_triangle(0, 1, 2);
        mesh.compute_normals();
        for chunk in mesh.vertices.chunks_exact(6) {
            assert_eq!(Vec3::new(chunk[3], chunk[4], chunk[5]), Vec3::Z);
        }
    }
}
