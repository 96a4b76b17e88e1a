//! Near-plane clipping in view space.

use crate::geometry::Triangle;
use crate::math::Vector3;

/// View-space vertex carried through clipping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipVertex {
    /// View-space position.
    pub position: Vector3,
    /// Texture coordinate, interpolated with the position.
    pub uv: [f64; 2],
}

impl ClipVertex {
    /// Vertex without texture coordinates.
    #[inline]
    pub const fn new(position: Vector3) -> Self {
        Self { position, uv: [0.0, 0.0] }
    }

    /// Vertex with texture coordinates.
    #[inline]
    pub const fn with_uv(position: Vector3, uv: [f64; 2]) -> Self {
        Self { position, uv }
    }

    fn lerp(&self, other: &ClipVertex, t: f64) -> Self {
        Self {
            position: self.position.lerp(&other.position, t),
            uv: [
                self.uv[0] + (other.uv[0] - self.uv[0]) * t,
                self.uv[1] + (other.uv[1] - self.uv[1]) * t,
            ],
        }
    }
}

/// Up to two triangles produced by clipping one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipOutput {
    triangles: [[ClipVertex; 3]; 2],
    len: usize,
}

impl ClipOutput {
    const EMPTY: Self = Self {
        triangles: [[ClipVertex::new(Vector3::ZERO); 3]; 2],
        len: 0,
    };

    fn push(&mut self, tri: [ClipVertex; 3]) {
        self.triangles[self.len] = tri;
        self.len += 1;
    }

    /// Number of output triangles.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the input was dropped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Output triangles.
    #[inline]
    pub fn as_slice(&self) -> &[[ClipVertex; 3]] {
        &self.triangles[..self.len]
    }
}

/// Point where the edge from a vertex behind the plane to one in front of it
/// crosses `z = near`.
#[inline]
fn intersect(behind: &ClipVertex, front: &ClipVertex, near: f64) -> ClipVertex {
    let (zb, zf) = (behind.position.z, front.position.z);
    let t = if zf != zb { ((near - zb) / (zf - zb)).clamp(0.0, 1.0) } else { 0.0 };
    behind.lerp(front, t)
}

/// Clip a view-space triangle against `z = near`. A vertex with `z < near`
/// counts as behind. Winding is preserved.
pub fn clip_triangle(vertices: [ClipVertex; 3], near: f64) -> ClipOutput {
    let behind = vertices.map(|v| v.position.z < near);
    let count = behind.iter().filter(|b| **b).count();
    let mut out = ClipOutput::EMPTY;

    match count {
        0 => out.push(vertices),
        1 => {
            let i = behind.iter().position(|b| *b).unwrap_or(0);
            let (vi, vj, vk) = (vertices[i], vertices[(i + 1) % 3], vertices[(i + 2) % 3]);
            let pij = intersect(&vi, &vj, near);
            let pki = intersect(&vi, &vk, near);
            out.push([pij, vj, vk]);
            out.push([pij, vk, pki]);
        }
        2 => {
            let i = behind.iter().position(|b| !*b).unwrap_or(0);
            let (vi, vj, vk) = (vertices[i], vertices[(i + 1) % 3], vertices[(i + 2) % 3]);
            out.push([vi, intersect(&vj, &vi, near), intersect(&vk, &vi, near)]);
        }
        _ => {}
    }
    out
}

/// Clip a view-space renderable triangle. Material, explicit normal and glyph
/// carry over to every piece.
pub fn clip_face(triangle: &Triangle, near: f64) -> Vec<Triangle> {
    let out = clip_triangle(triangle.vertices.map(ClipVertex::new), near);
    out.as_slice()
        .iter()
        .map(|tri| Triangle {
            vertices: tri.map(|v| v.position),
            ..triangle.clone()
        })
        .collect()
}

/// Clip a view-space segment against `z = near`. `None` when fully behind.
pub fn clip_line(a: Vector3, b: Vector3, near: f64) -> Option<(Vector3, Vector3)> {
    match (a.z < near, b.z < near) {
        (false, false) => Some((a, b)),
        (true, true) => None,
        (true, false) => {
            let p = intersect(&ClipVertex::new(a), &ClipVertex::new(b), near);
            Some((p.position, b))
        }
        (false, true) => {
            let p = intersect(&ClipVertex::new(b), &ClipVertex::new(a), near);
            Some((a, p.position))
        }
    }
}
