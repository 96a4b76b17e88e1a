//! Filled disc primitive.

use super::Triangle;
use crate::material::Material;
use crate::math::{Aabb, Vector3};
use std::sync::Arc;

/// A filled disc in the local XY plane, facing +Z.
#[derive(Debug, Clone)]
pub struct Circle {
    /// Disc radius.
    pub radius: f64,
    /// Number of fan segments, at least 3.
    pub segments: usize,
    /// Shared material.
    pub material: Arc<Material>,
    /// Fixed fill glyph.
    pub glyph: Option<char>,
}

impl Circle {
    /// Create a disc with 24 segments.
    pub fn new(radius: f64, material: Arc<Material>) -> Self {
        Self {
            radius,
            segments: 24,
            material,
            glyph: None,
        }
    }

    /// Set the segment count.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(3);
        self
    }

    /// Triangle fan around the center.
    pub fn triangles(&self) -> Vec<Triangle> {
        let n = self.segments.max(3);
        let rim = |i: usize| {
            let theta = i as f64 / n as f64 * std::f64::consts::TAU;
            Vector3::new(self.radius * theta.cos(), self.radius * theta.sin(), 0.0)
        };
        (0..n)
            .map(|i| Triangle {
                vertices: [Vector3::ZERO, rim(i), rim(i + 1)],
                normal: None,
                material: Arc::clone(&self.material),
                glyph: self.glyph,
            })
            .collect()
    }

    /// Bounding box of the disc.
    pub fn bounds(&self) -> Aabb {
        let r = self.radius.abs();
        Aabb::new(Vector3::new(-r, -r, 0.0), Vector3::new(r, r, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan() {
        let c = Circle::new(2.0, Arc::new(Material::default())).with_segments(8);
        let tris = c.triangles();
        assert_eq!(tris.len(), 8);
        let area: f64 = tris.iter().map(|t| t.shape().area()).sum();
        // Regular octagon inscribed in r = 2.
        assert!((area - 2.0 * 8.0_f64.sqrt() * 2.0).abs() < 1e-9);
        assert!(tris.iter().all(|t| t.face_normal().approx_eq(&Vector3::UNIT_Z, 1e-9)));
    }
}
