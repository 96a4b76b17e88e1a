//! Renderable triangle.

use crate::material::Material;
use crate::math::{self, Aabb, Euler, Matrix4, Vector3};
use std::sync::Arc;

/// A triangle with its surface description.
///
/// When `normal` is set it overrides the computed face normal and is rotated
/// together with the vertices.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertex positions.
    pub vertices: [Vector3; 3],
    /// Explicit normal.
    pub normal: Option<Vector3>,
    /// Shared material.
    pub material: Arc<Material>,
    /// Fixed fill glyph, bypassing the brightness ramp.
    pub glyph: Option<char>,
}

impl Triangle {
    /// Create a triangle.
    pub fn new(a: Vector3, b: Vector3, c: Vector3, material: Arc<Material>) -> Self {
        Self {
            vertices: [a, b, c],
            normal: None,
            material,
            glyph: None,
        }
    }

    /// Set an explicit normal.
    pub fn with_normal(mut self, normal: Vector3) -> Self {
        self.normal = Some(normal.normalized());
        self
    }

    /// Set a fixed glyph.
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = Some(glyph);
        self
    }

    /// Whether an explicit normal is set.
    #[inline]
    pub fn has_explicit_normal(&self) -> bool {
        self.normal.is_some()
    }

    /// Geometric part of the triangle.
    #[inline]
    pub fn shape(&self) -> math::Triangle {
        math::Triangle::new(self.vertices[0], self.vertices[1], self.vertices[2])
    }

    /// Explicit normal if set, else the normalized `(P1 - P0) × (P2 - P0)`.
    pub fn face_normal(&self) -> Vector3 {
        self.normal.unwrap_or_else(|| self.shape().normal())
    }

    /// Average of the vertices.
    #[inline]
    pub fn centroid(&self) -> Vector3 {
        self.shape().centroid()
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Rotate about the origin, carrying the explicit normal along.
    pub fn rotate(&mut self, rotation: &Euler) {
        let m = Matrix4::from_euler(rotation);
        for v in &mut self.vertices {
            *v = m.transform_direction(v);
        }
        if let Some(n) = self.normal.as_mut() {
            *n = m.transform_direction(n).normalized();
        }
    }

    /// Copy with vertices (and explicit normal) mapped through an affine matrix.
    pub fn transformed(&self, m: &Matrix4) -> Self {
        let normal_matrix = m.inverse().transposed();
        Self {
            vertices: self.vertices.map(|v| m.transform_point(&v)),
            normal: self.normal.map(|n| normal_matrix.transform_direction(&n).normalized()),
            material: Arc::clone(&self.material),
            glyph: self.glyph,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Triangle {
        Triangle::new(
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Arc::new(Material::default()),
        )
    }

    #[test]
    fn test_face_normal() {
        assert!(tri().face_normal().approx_eq(&Vector3::UNIT_Z, 1e-12));
        let t = tri().with_normal(Vector3::new(0.0, 2.0, 0.0));
        assert!(t.has_explicit_normal());
        assert!(t.face_normal().approx_eq(&Vector3::UNIT_Y, 1e-12));
    }

    #[test]
    fn test_rotate_carries_normal() {
        let mut t = tri().with_normal(Vector3::UNIT_Z);
        t.rotate(&Euler::new(0.0, std::f64::consts::FRAC_PI_2, 0.0));
        assert!(t.normal.is_some_and(|n| n.approx_eq(&Vector3::UNIT_X, 1e-9)));
        assert!(t.shape().normal().approx_eq(&Vector3::UNIT_X, 1e-9));
    }
}
