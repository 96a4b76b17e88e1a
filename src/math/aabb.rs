//! Axis-aligned bounding box implementation.

use super::{Matrix4, Ray, Sphere, Vector3};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vector3,
    /// Maximum corner.
    pub max: Vector3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Empty box (inverted, ready to expand).
    pub const EMPTY: Self = Self {
        min: Vector3 { x: f64::INFINITY, y: f64::INFINITY, z: f64::INFINITY },
        max: Vector3 { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY, z: f64::NEG_INFINITY },
    };

    /// Create a new box.
    #[inline]
    pub const fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Create a box from center and size.
    pub fn from_center_size(center: Vector3, size: Vector3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Create a box bounding a set of points.
    pub fn from_points(points: &[Vector3]) -> Self {
        let mut result = Self::EMPTY;
        for p in points {
            result.expand_by_point(p);
        }
        result
    }

    /// Check if the box is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vector3 {
        if self.is_empty() {
            Vector3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Alias for [`Aabb::center`], used by the BVH builder.
    #[inline]
    pub fn centroid(&self) -> Vector3 {
        self.center()
    }

    /// Get the size of the box.
    #[inline]
    pub fn size(&self) -> Vector3 {
        if self.is_empty() {
            Vector3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Half of the size along each axis.
    #[inline]
    pub fn half_extents(&self) -> Vector3 {
        self.size() * 0.5
    }

    /// Total surface area. Empty boxes have zero area.
    #[inline]
    pub fn surface_area(&self) -> f64 {
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z).
    pub fn longest_axis(&self) -> usize {
        let d = self.size();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Expand to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, point: &Vector3) -> &mut Self {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self
    }

    /// Expand by a scalar amount in all directions.
    #[inline]
    pub fn expand_by_scalar(&mut self, scalar: f64) -> &mut Self {
        self.min = self.min - Vector3::splat(scalar);
        self.max = self.max + Vector3::splat(scalar);
        self
    }

    /// Check if a point is inside the box (boundary inclusive).
    #[inline]
    pub fn contains_point(&self, point: &Vector3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box fully contains another box.
    #[inline]
    pub fn contains_box(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && other.max.x <= self.max.x
            && self.min.y <= other.min.y && other.max.y <= self.max.y
            && self.min.z <= other.min.z && other.max.z <= self.max.z
    }

    /// Check if this box overlaps another box. Touching faces count as overlap.
    #[inline]
    pub fn intersects_box(&self, other: &Aabb) -> bool {
        other.max.x >= self.min.x && other.min.x <= self.max.x
            && other.max.y >= self.min.y && other.min.y <= self.max.y
            && other.max.z >= self.min.z && other.min.z <= self.max.z
    }

    /// Check if this box intersects a sphere.
    #[inline]
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.clamp_point(&sphere.center);
        closest.distance_to_squared(&sphere.center) <= sphere.radius * sphere.radius
    }

    /// Ray entry distance using the slab method, if the ray hits within `max_distance`.
    #[inline]
    pub fn intersect_ray(&self, ray: &Ray, max_distance: f64) -> Option<f64> {
        ray.intersect_aabb(self).filter(|t| *t <= max_distance)
    }

    /// Clamp a point to the box.
    #[inline]
    pub fn clamp_point(&self, point: &Vector3) -> Vector3 {
        point.clamp(&self.min, &self.max)
    }

    /// Get the bounding sphere of this box.
    pub fn bounding_sphere(&self) -> Sphere {
        Sphere::from_aabb(self)
    }

    /// Get the union of this box with another.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Get the box of the transformed corners.
    pub fn apply_matrix4(&self, m: &Matrix4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let mut result = Self::EMPTY;
        for corner in &self.corners() {
            result.expand_by_point(&m.transform_point(corner));
        }
        result
    }

    /// Translate the box.
    #[inline]
    pub fn translate(&self, offset: &Vector3) -> Self {
        Self {
            min: self.min + *offset,
            max: self.max + *offset,
        }
    }

    /// Get the 8 corners of the box.
    pub fn corners(&self) -> [Vector3; 8] {
        [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// The eight equal sub-boxes of this box, indexed by `x | y << 1 | z << 2`
    /// where a set bit selects the upper half on that axis.
    pub fn octants(&self) -> [Aabb; 8] {
        let c = self.center();
        let mut out = [Aabb::EMPTY; 8];
        for (i, oct) in out.iter_mut().enumerate() {
            let pick = |bit: usize, lo: f64, mid: f64, hi: f64| {
                if i & bit == 0 { (lo, mid) } else { (mid, hi) }
            };
            let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
            let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
            let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
            *oct = Aabb::new(Vector3::new(x0, y0, z0), Vector3::new(x1, y1, z1));
        }
        out
    }

    /// Check if approximately equal.
    #[inline]
    pub fn approx_eq(&self, other: &Aabb, epsilon: f64) -> bool {
        self.min.approx_eq(&other.min, epsilon) && self.max.approx_eq(&other.max, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_size() {
        let b = Aabb::from_center_size(Vector3::ZERO, Vector3::ONE);
        assert!(b.center().approx_eq(&Vector3::ZERO, 1e-12));
        assert!(b.size().approx_eq(&Vector3::ONE, 1e-12));
    }

    #[test]
    fn test_surface_area() {
        let b = Aabb::new(Vector3::ZERO, Vector3::new(1.0, 2.0, 3.0));
        assert!((b.surface_area() - 22.0).abs() < 1e-12);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
        assert_eq!(b.longest_axis(), 2);
    }

    #[test]
    fn test_octants_partition() {
        let b = Aabb::new(Vector3::ZERO, Vector3::splat(2.0));
        let octs = b.octants();
        let total: f64 = octs.iter().map(|o| {
            let s = o.size();
            s.x * s.y * s.z
        }).sum();
        assert!((total - 8.0).abs() < 1e-12);
        assert!(octs[7].approx_eq(&Aabb::new(Vector3::ONE, Vector3::splat(2.0)), 1e-12));
    }

    #[test]
    fn test_expand() {
        let mut b = Aabb::EMPTY;
        b.expand_by_point(&Vector3::ZERO);
        b.expand_by_point(&Vector3::ONE);
        assert!(b.min.approx_eq(&Vector3::ZERO, 1e-12));
        assert!(b.max.approx_eq(&Vector3::ONE, 1e-12));
    }
}
