//! Geometric triangle.

use super::{Aabb, Plane, Vector3};
use serde::{Deserialize, Serialize};

/// A triangle defined by three positions. Carries no material.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Triangle {
    /// First vertex.
    pub a: Vector3,
    /// Second vertex.
    pub b: Vector3,
    /// Third vertex.
    pub c: Vector3,
}

impl Triangle {
    /// Create a new triangle.
    #[inline]
    pub const fn new(a: Vector3, b: Vector3, c: Vector3) -> Self {
        Self { a, b, c }
    }

    /// Get the area of the triangle.
    pub fn area(&self) -> f64 {
        self.raw_normal().length() * 0.5
    }

    /// Get the centroid of the triangle.
    #[inline]
    pub fn centroid(&self) -> Vector3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Unnormalized `(b - a) × (c - a)`.
    #[inline]
    pub fn raw_normal(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Unit face normal. Zero for degenerate triangles.
    pub fn normal(&self) -> Vector3 {
        self.raw_normal().normalized()
    }

    /// True when the vertices are collinear (or coincident) within `epsilon` area.
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        !self.a.is_finite() || !self.b.is_finite() || !self.c.is_finite() || self.area() <= epsilon
    }

    /// Get the plane containing this triangle.
    pub fn plane(&self) -> Plane {
        Plane::from_coplanar_points(&self.a, &self.b, &self.c)
    }

    /// Get the bounding box of this triangle.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(&[self.a, self.b, self.c])
    }

    /// Barycentric weights `(wa, wb, wc)` of a point in the triangle's plane.
    pub fn barycentric(&self, point: &Vector3) -> (f64, f64, f64) {
        let v0 = self.b - self.a;
        let v1 = self.c - self.a;
        let v2 = *point - self.a;

        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let d20 = v2.dot(&v0);
        let d21 = v2.dot(&v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < 1e-12 {
            return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        }

        let wb = (d11 * d20 - d01 * d21) / denom;
        let wc = (d00 * d21 - d01 * d20) / denom;
        (1.0 - wb - wc, wb, wc)
    }

    /// Check if a point in the triangle's plane is inside it.
    pub fn contains_point(&self, point: &Vector3) -> bool {
        let (a, b, c) = self.barycentric(point);
        a >= 0.0 && b >= 0.0 && c >= 0.0
    }
}
