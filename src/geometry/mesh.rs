//! Indexed triangle mesh.

use super::Triangle;
use crate::material::Material;
use crate::math::{Aabb, Vector3};
use std::sync::Arc;

/// Indexed triangle list. Every three indices form one face.
///
/// Indices outside the vertex array are tolerated: the affected face is
/// reported as invalid and skipped by the renderer.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Vector3>,
    /// Per-vertex texture coordinates.
    pub uvs: Option<Vec<[f64; 2]>>,
    /// Per-vertex normals.
    pub normals: Option<Vec<Vector3>>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Local offset added to every vertex.
    pub offset: Vector3,
    /// Shared material.
    pub material: Arc<Material>,
}

impl Mesh {
    /// Create a mesh from positions and indices.
    pub fn new(vertices: Vec<Vector3>, indices: Vec<u32>, material: Arc<Material>) -> Self {
        Self {
            vertices,
            uvs: None,
            normals: None,
            indices,
            offset: Vector3::ZERO,
            material,
        }
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vector3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<[f64; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Set the local offset.
    pub fn with_offset(mut self, offset: Vector3) -> Self {
        self.offset = offset;
        self
    }

    /// Axis-aligned cube centered on the origin with outward-facing faces.
    pub fn cube(size: f64, material: Arc<Material>) -> Self {
        let h = size * 0.5;
        // (normal, u, v) with u × v = normal.
        let faces = [
            (Vector3::UNIT_X, Vector3::UNIT_Y, Vector3::UNIT_Z),
            (-Vector3::UNIT_X, Vector3::UNIT_Z, Vector3::UNIT_Y),
            (Vector3::UNIT_Y, Vector3::UNIT_Z, Vector3::UNIT_X),
            (-Vector3::UNIT_Y, Vector3::UNIT_X, Vector3::UNIT_Z),
            (Vector3::UNIT_Z, Vector3::UNIT_X, Vector3::UNIT_Y),
            (-Vector3::UNIT_Z, Vector3::UNIT_Y, Vector3::UNIT_X),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            let c = n * h;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                vertices.push(c + u * (su * h) + v * (sv * h));
                normals.push(n);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices, material).with_normals(normals)
    }

    /// Latitude/longitude sphere. Pole rows emit one triangle per segment.
    pub fn uv_sphere(radius: f64, width_segments: u32, height_segments: u32, material: Arc<Material>) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut grid: Vec<Vec<u32>> = Vec::new();

        for iy in 0..=hs {
            let v = iy as f64 / hs as f64;
            let theta = v * std::f64::consts::PI;
            let mut row = Vec::new();
            for ix in 0..=ws {
                let u = ix as f64 / ws as f64;
                let phi = u * std::f64::consts::TAU;
                let p = Vector3::new(
                    -radius * theta.sin() * phi.cos(),
                    radius * theta.cos(),
                    radius * theta.sin() * phi.sin(),
                );
                row.push(vertices.len() as u32);
                normals.push(p.normalized());
                uvs.push([u, 1.0 - v]);
                vertices.push(p);
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..hs as usize {
            for ix in 0..ws as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::new(vertices, indices, material)
            .with_normals(normals)
            .with_uvs(uvs)
    }

    /// Number of faces described by the index list.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Offset-applied positions of face `i`, or `None` if any index is out of range.
    pub fn face_positions(&self, i: usize) -> Option<[Vector3; 3]> {
        let idx = self.indices.get(i * 3..i * 3 + 3)?;
        let mut out = [Vector3::ZERO; 3];
        for (slot, &index) in out.iter_mut().zip(idx) {
            *slot = *self.vertices.get(index as usize)? + self.offset;
        }
        Some(out)
    }

    /// Average of the vertex normals of face `i`, when normals are present.
    pub fn face_normal(&self, i: usize) -> Option<Vector3> {
        let normals = self.normals.as_ref()?;
        let idx = self.indices.get(i * 3..i * 3 + 3)?;
        let mut sum = Vector3::ZERO;
        for &index in idx {
            sum += *normals.get(index as usize)?;
        }
        let n = sum.normalized();
        (n != Vector3::ZERO).then_some(n)
    }

    /// Face `i` as a triangle carrying the mesh material.
    pub fn face(&self, i: usize) -> Option<Triangle> {
        let [a, b, c] = self.face_positions(i)?;
        Some(Triangle {
            vertices: [a, b, c],
            normal: self.face_normal(i),
            material: Arc::clone(&self.material),
            glyph: None,
        })
    }

    /// All faces in index order; `None` marks a malformed face.
    pub fn faces(&self) -> impl Iterator<Item = Option<Triangle>> + '_ {
        (0..self.face_count()).map(move |i| self.face(i))
    }

    /// Bounding box of the offset vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices).translate(&self.offset)
    }

    /// Positions linearly blended toward `other`. `None` when vertex counts differ.
    pub fn morph_towards(&self, other: &Mesh, t: f64) -> Option<Mesh> {
        if self.vertices.len() != other.vertices.len() {
            return None;
        }
        let mut out = self.clone();
        for (v, target) in out.vertices.iter_mut().zip(&other.vertices) {
            *v = v.lerp(target, t);
        }
        out.offset = self.offset.lerp(&other.offset, t);
        Some(out)
    }
}
