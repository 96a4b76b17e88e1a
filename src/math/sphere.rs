//! Bounding sphere implementation.

use super::{Aabb, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// A bounding sphere defined by center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: Vector3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl Sphere {
    /// Create a new sphere.
    #[inline]
    pub const fn new(center: Vector3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Create a sphere that bounds an array of points.
    pub fn from_points(points: &[Vector3]) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let center = Aabb::from_points(points).center();
        let max_dist_sq = points
            .iter()
            .map(|p| center.distance_to_squared(p))
            .fold(0.0_f64, f64::max);

        Self {
            center,
            radius: max_dist_sq.sqrt(),
        }
    }

    /// Create a sphere from a bounding box.
    pub fn from_aabb(aabb: &Aabb) -> Self {
        if aabb.is_empty() {
            return Self::default();
        }
        let center = aabb.center();
        Self {
            center,
            radius: center.distance_to(&aabb.max),
        }
    }

    /// Check if a point is inside the sphere.
    #[inline]
    pub fn contains_point(&self, point: &Vector3) -> bool {
        self.center.distance_to_squared(point) <= self.radius * self.radius
    }

    /// Check if this sphere intersects another sphere.
    #[inline]
    pub fn intersects_sphere(&self, other: &Sphere) -> bool {
        let radius_sum = self.radius + other.radius;
        self.center.distance_to_squared(&other.center) <= radius_sum * radius_sum
    }

    /// Get the bounding box of this sphere.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::new(
            self.center - Vector3::splat(self.radius),
            self.center + Vector3::splat(self.radius),
        )
    }

    /// Apply a Matrix4 transformation. The radius grows by the largest scale axis.
    pub fn apply_matrix4(&self, m: &Matrix4) -> Self {
        Self {
            center: m.transform_point(&self.center),
            radius: self.radius * m.get_max_scale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point() {
        let s = Sphere::new(Vector3::ZERO, 1.0);
        assert!(s.contains_point(&Vector3::new(0.5, 0.5, 0.0)));
        assert!(!s.contains_point(&Vector3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_apply_scaled_matrix() {
        let s = Sphere::new(Vector3::ZERO, 1.0);
        let m = Matrix4::from_translation(&Vector3::new(1.0, 0.0, 0.0))
            * Matrix4::from_scale(&Vector3::new(1.0, 3.0, 2.0));
        let t = s.apply_matrix4(&m);
        assert!(t.center.approx_eq(&Vector3::UNIT_X, 1e-12));
        assert!((t.radius - 3.0).abs() < 1e-12);
    }
}
