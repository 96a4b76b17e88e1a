//! Oriented bounding box.

use super::{Aabb, Matrix4, Ray, Vector3};
use serde::{Deserialize, Serialize};

/// A box with arbitrary orthonormal axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    /// Center in world space.
    pub center: Vector3,
    /// Orthonormal local axes.
    pub axes: [Vector3; 3],
    /// Half size along each axis.
    pub half_extents: Vector3,
}

impl Obb {
    /// Create a new OBB. Axes are normalized.
    pub fn new(center: Vector3, axes: [Vector3; 3], half_extents: Vector3) -> Self {
        Self {
            center,
            axes: axes.map(|a| a.normalized()),
            half_extents,
        }
    }

    /// Oriented box of a local-space AABB under an affine matrix.
    /// Scale is folded into the half extents.
    pub fn from_aabb(aabb: &Aabb, m: &Matrix4) -> Self {
        let center = m.transform_point(&aabb.center());
        let half = aabb.half_extents();
        let basis = [
            m.transform_direction(&Vector3::UNIT_X),
            m.transform_direction(&Vector3::UNIT_Y),
            m.transform_direction(&Vector3::UNIT_Z),
        ];
        let half_extents = Vector3::new(
            half.x * basis[0].length(),
            half.y * basis[1].length(),
            half.z * basis[2].length(),
        );
        Self::new(center, basis, half_extents)
    }

    /// Point expressed in the box's local frame.
    #[inline]
    fn to_local(&self, p: &Vector3) -> Vector3 {
        let d = *p - self.center;
        Vector3::new(d.dot(&self.axes[0]), d.dot(&self.axes[1]), d.dot(&self.axes[2]))
    }

    /// Check whether a point lies inside the box.
    pub fn contains_point(&self, p: &Vector3) -> bool {
        let l = self.to_local(p).abs();
        l.x <= self.half_extents.x && l.y <= self.half_extents.y && l.z <= self.half_extents.z
    }

    /// Projection radius of the box onto an axis.
    #[inline]
    fn project_radius(&self, axis: &Vector3) -> f64 {
        (0..3)
            .map(|i| self.half_extents[i] * self.axes[i].dot(axis).abs())
            .sum()
    }

    /// Separating axis test against another OBB (15 candidate axes).
    pub fn intersects_obb(&self, other: &Obb) -> bool {
        let t = other.center - self.center;
        let mut candidates = Vec::with_capacity(15);
        candidates.extend_from_slice(&self.axes);
        candidates.extend_from_slice(&other.axes);
        for a in &self.axes {
            for b in &other.axes {
                let c = a.cross(b);
                // Parallel edges give no new axis.
                if c.length_squared() > 1e-12 {
                    candidates.push(c.normalized());
                }
            }
        }
        candidates.iter().all(|axis| {
            t.dot(axis).abs() <= self.project_radius(axis) + other.project_radius(axis)
        })
    }

    /// Slab test in the box's frame; returns the entry distance.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let origin = self.to_local(&ray.origin);
        let direction = Vector3::new(
            ray.direction.dot(&self.axes[0]),
            ray.direction.dot(&self.axes[1]),
            ray.direction.dot(&self.axes[2]),
        );
        let local = Ray { origin, direction };
        local.intersect_aabb(&Aabb::new(-self.half_extents, self.half_extents))
    }

    /// Smallest axis-aligned box enclosing this one.
    pub fn enclosing_aabb(&self) -> Aabb {
        let extent = Vector3::new(
            self.project_radius(&Vector3::UNIT_X),
            self.project_radius(&Vector3::UNIT_Y),
            self.project_radius(&Vector3::UNIT_Z),
        );
        Aabb::new(self.center - extent, self.center + extent)
    }
}
