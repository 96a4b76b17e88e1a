//! Plane implementation.

use super::Vector3;
use serde::{Deserialize, Serialize};

/// An infinite plane defined by a normal and constant.
/// The plane equation is: normal · point + constant = 0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    /// Normal vector of the plane (should be normalized).
    pub normal: Vector3,
    /// Negative of the distance from the origin along the normal.
    pub constant: f64,
}

impl Plane {
    /// Create a new plane.
    #[inline]
    pub const fn new(normal: Vector3, constant: f64) -> Self {
        Self { normal, constant }
    }

    /// Create a plane from normal and a point on the plane.
    #[inline]
    pub fn from_normal_and_point(normal: Vector3, point: &Vector3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            constant: -point.dot(&n),
        }
    }

    /// Create a plane from three coplanar points.
    pub fn from_coplanar_points(a: &Vector3, b: &Vector3, c: &Vector3) -> Self {
        let normal = (*b - *a).cross(&(*c - *a)).normalized();
        Self::from_normal_and_point(normal, a)
    }

    /// Get signed distance from a point to the plane.
    /// Positive = point is on the normal side.
    #[inline]
    pub fn distance_to_point(&self, point: &Vector3) -> f64 {
        self.normal.dot(point) + self.constant
    }

    /// Get the projection of a point onto the plane.
    #[inline]
    pub fn project_point(&self, point: &Vector3) -> Vector3 {
        *point - self.normal * self.distance_to_point(point)
    }

    /// Check if a point is on the positive side of the plane.
    #[inline]
    pub fn is_point_in_front(&self, point: &Vector3) -> bool {
        self.distance_to_point(point) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_point() {
        let plane = Plane::new(Vector3::UNIT_Y, 0.0);
        assert!((plane.distance_to_point(&Vector3::new(0.0, 5.0, 0.0)) - 5.0).abs() < 1e-12);
        assert!((plane.distance_to_point(&Vector3::new(0.0, -3.0, 0.0)) + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::from_normal_and_point(Vector3::UNIT_Y, &Vector3::new(0.0, 2.0, 0.0));
        let projected = plane.project_point(&Vector3::new(1.0, 5.0, 2.0));
        assert!(projected.approx_eq(&Vector3::new(1.0, 2.0, 2.0), 1e-12));
    }
}
