//! Four-vertex planar polygon.

use super::Triangle;
use crate::material::Material;
use crate::math::{Aabb, Vector3};
use std::sync::Arc;

/// Four coplanar vertices, split into `P0P1P2` and `P0P2P3` for drawing.
#[derive(Debug, Clone)]
pub struct Quad {
    /// Vertex positions in order around the edge.
    pub vertices: [Vector3; 4],
    /// Explicit normal shared by both halves.
    pub normal: Option<Vector3>,
    /// Shared material.
    pub material: Arc<Material>,
    /// Fixed fill glyph.
    pub glyph: Option<char>,
}

impl Quad {
    /// Create a quad.
    pub fn new(vertices: [Vector3; 4], material: Arc<Material>) -> Self {
        Self {
            vertices,
            normal: None,
            material,
            glyph: None,
        }
    }

    /// Axis-aligned square in the local XY plane, facing +Z.
    pub fn square(size: f64, material: Arc<Material>) -> Self {
        let h = size * 0.5;
        Self::new(
            [
                Vector3::new(-h, -h, 0.0),
                Vector3::new(h, -h, 0.0),
                Vector3::new(h, h, 0.0),
                Vector3::new(-h, h, 0.0),
            ],
            material,
        )
    }

    /// The two triangles drawn for this quad.
    pub fn triangles(&self) -> [Triangle; 2] {
        let [p0, p1, p2, p3] = self.vertices;
        let make = |a, b, c| Triangle {
            vertices: [a, b, c],
            normal: self.normal,
            material: Arc::clone(&self.material),
            glyph: self.glyph,
        };
        [make(p0, p1, p2), make(p0, p2, p3)]
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        let q = Quad::square(2.0, Arc::new(Material::default()));
        let [a, b] = q.triangles();
        assert_eq!(a.vertices, [q.vertices[0], q.vertices[1], q.vertices[2]]);
        assert_eq!(b.vertices, [q.vertices[0], q.vertices[2], q.vertices[3]]);
        assert!(a.face_normal().approx_eq(&b.face_normal(), 1e-12));
    }
}
