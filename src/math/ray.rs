//! Ray implementation for raycasting.

use super::{Aabb, Matrix4, Sphere, Triangle, Vector3};
use serde::{Deserialize, Serialize};

/// Determinant threshold below which a ray is treated as parallel to a triangle.
pub const RAY_EPSILON: f64 = 1e-8;

/// A ray with an origin and direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Vector3,
    /// Direction of the ray (normalized on construction).
    pub direction: Vector3,
}

/// A ray/triangle hit: distance along the ray plus barycentrics of `b` and `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance from the ray origin.
    pub distance: f64,
    /// Weight of the second vertex.
    pub u: f64,
    /// Weight of the third vertex.
    pub v: f64,
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    #[inline]
    pub fn new(origin: Vector3, direction: Vector3) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    /// Ray from `from` pointing at `to`.
    #[inline]
    pub fn between(from: &Vector3, to: &Vector3) -> Self {
        Self::new(*from, *to - *from)
    }

    /// Get a point at distance t along the ray.
    #[inline]
    pub fn at(&self, t: f64) -> Vector3 {
        self.origin + self.direction * t
    }

    /// Intersect with a sphere. Returns the distance to the first hit in front of the origin.
    pub fn intersect_sphere(&self, sphere: &Sphere) -> Option<f64> {
        let oc = self.origin - sphere.center;
        let b = oc.dot(&self.direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = -b - sqrt_discriminant;
        let t2 = -b + sqrt_discriminant;

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// Slab test against an axis-aligned box.
    /// Returns (tmin, tmax) clamped to start at the origin.
    pub fn intersect_box(&self, aabb: &Aabb) -> Option<(f64, f64)> {
        let mut tmin = f64::NEG_INFINITY;
        let mut tmax = f64::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if d.abs() < f64::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
        }

        if tmax < 0.0 || tmin > tmax {
            None
        } else {
            Some((tmin.max(0.0), tmax))
        }
    }

    /// Entry distance into a box, or `None` on a miss.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f64> {
        self.intersect_box(aabb).map(|(t, _)| t)
    }

    /// Möller–Trumbore intersection. Both windings are hit.
    pub fn intersect_triangle(&self, triangle: &Triangle) -> Option<TriangleHit> {
        let edge1 = triangle.b - triangle.a;
        let edge2 = triangle.c - triangle.a;
        let h = self.direction.cross(&edge2);
        let det = edge1.dot(&h);

        if det.abs() < RAY_EPSILON {
            return None;
        }

        let f = 1.0 / det;
        let s = self.origin - triangle.a;
        let u = f * s.dot(&h);
        if !(-RAY_EPSILON..=1.0 + RAY_EPSILON).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);
        if v < -RAY_EPSILON || u + v > 1.0 + RAY_EPSILON {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t > RAY_EPSILON).then_some(TriangleHit { distance: t, u, v })
    }

    /// Apply a Matrix4 transformation to this ray.
    pub fn apply_matrix4(&self, m: &Matrix4) -> Self {
        Self {
            origin: m.transform_point(&self.origin),
            direction: m.transform_direction(&self.direction).normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vector3::ZERO, Vector3::new(0.0, 0.0, 2.0));
        assert!(ray.at(5.0).approx_eq(&Vector3::new(0.0, 0.0, 5.0), 1e-12));
    }

    #[test]
    fn test_sphere_intersection() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::UNIT_Z);
        let t = ray.intersect_sphere(&Sphere::new(Vector3::ZERO, 1.0));
        assert!(matches!(t, Some(t) if (t - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_box_axis_parallel() {
        let ray = Ray::new(Vector3::new(-10.0, 0.5, 0.5), Vector3::UNIT_X);
        let b = Aabb::new(Vector3::ZERO, Vector3::ONE);
        assert_eq!(ray.intersect_box(&b), Some((10.0, 11.0)));

        let miss = Ray::new(Vector3::new(-10.0, 2.0, 0.5), Vector3::UNIT_X);
        assert!(miss.intersect_box(&b).is_none());
    }

    #[test]
    fn test_triangle_hit_and_parallel() {
        let tri = Triangle::new(
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::UNIT_Z);
        let hit = ray.intersect_triangle(&tri).map(|h| h.distance);
        assert!(matches!(hit, Some(d) if (d - 5.0).abs() < 1e-12));

        let parallel = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::UNIT_X);
        assert!(parallel.intersect_triangle(&tri).is_none());

        let behind = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::UNIT_Z);
        assert!(behind.intersect_triangle(&tri).is_none());
    }
}
